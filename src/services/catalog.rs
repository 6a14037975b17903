use crate::{
    db::DbPool,
    entities::service,
    errors::ServiceError,
    models,
    services::activity::ActivityLogService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateServiceInput {
    pub name: String,
    pub service_type: String,
    pub price: Decimal,
    pub estimated_hours: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceInput {
    pub name: Option<String>,
    pub service_type: Option<String>,
    pub price: Option<Decimal>,
    pub estimated_hours: Option<i32>,
    pub is_active: Option<bool>,
}

/// Service catalog management. Entries are soft deleted so historical
/// order items keep their service reference.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    activity: Arc<ActivityLogService>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, activity: Arc<ActivityLogService>) -> Self {
        Self { db_pool, activity }
    }

    #[instrument(skip(self))]
    pub async fn list_services(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<service::Model>, ServiceError> {
        let mut query = service::Entity::find();
        if !include_inactive {
            query = query.filter(service::Column::IsActive.eq(true));
        }

        query
            .order_by_asc(service::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self), fields(service_id = %service_id))]
    pub async fn get_service(&self, service_id: Uuid) -> Result<service::Model, ServiceError> {
        service::Entity::find_by_id(service_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Layanan tidak ditemukan".to_string()))
    }

    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn create_service(
        &self,
        user_id: Uuid,
        input: CreateServiceInput,
    ) -> Result<service::Model, ServiceError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Nama layanan harus diisi".to_string(),
            ));
        }
        let service_type = models::parse_service_type(&input.service_type)?;
        if input.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Harga harus lebih dari 0".to_string(),
            ));
        }

        let now = Utc::now();
        let model = service::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            service_type: Set(service_type.to_string()),
            price: Set(input.price),
            estimated_hours: Set(input.estimated_hours.unwrap_or(24)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(service_id = %created.id, name = %created.name, "Service created");

        self.activity
            .record(
                user_id,
                "CREATE_SERVICE",
                "service",
                Some(created.id.to_string()),
                Some(json!({ "name": created.name })),
            )
            .await;

        Ok(created)
    }

    #[instrument(skip(self, input), fields(service_id = %service_id))]
    pub async fn update_service(
        &self,
        user_id: Uuid,
        service_id: Uuid,
        input: UpdateServiceInput,
    ) -> Result<service::Model, ServiceError> {
        let existing = self.get_service(service_id).await?;
        let mut active: service::ActiveModel = existing.into();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Nama layanan harus diisi".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(raw) = input.service_type {
            let service_type = models::parse_service_type(&raw)?;
            active.service_type = Set(service_type.to_string());
        }
        if let Some(price) = input.price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Harga harus lebih dari 0".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(hours) = input.estimated_hours {
            active.estimated_hours = Set(hours);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        self.activity
            .record(
                user_id,
                "UPDATE_SERVICE",
                "service",
                Some(service_id.to_string()),
                None,
            )
            .await;

        Ok(updated)
    }

    /// Soft delete: flips is_active off, keeping the row for old orders
    #[instrument(skip(self), fields(service_id = %service_id))]
    pub async fn delete_service(
        &self,
        user_id: Uuid,
        service_id: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.get_service(service_id).await?;
        let mut active: service::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        self.activity
            .record(
                user_id,
                "DELETE_SERVICE",
                "service",
                Some(service_id.to_string()),
                None,
            )
            .await;

        Ok(())
    }
}
