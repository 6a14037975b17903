use crate::{
    db::DbPool,
    entities::{customer, order},
    errors::ServiceError,
    services::activity::ActivityLogService,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub customer: customer::Model,
    pub order_count: u64,
}

#[derive(Debug, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: customer::Model,
    pub order_count: u64,
    pub recent_orders: Vec<order::Model>,
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    activity: Arc<ActivityLogService>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, activity: Arc<ActivityLogService>) -> Self {
        Self { db_pool, activity }
    }

    /// Lists customers, optionally filtered by a name or phone search,
    /// each with its total order count.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<CustomerSummary>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = customer::Entity::find();
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(customer::Column::Name.contains(term))
                    .add(customer::Column::Phone.contains(term)),
            );
        }

        let customers = query
            .order_by_desc(customer::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut summaries = Vec::with_capacity(customers.len());
        for c in customers {
            let order_count = order::Entity::find()
                .filter(order::Column::CustomerId.eq(c.id))
                .count(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            summaries.push(CustomerSummary {
                customer: c,
                order_count,
            });
        }

        Ok(summaries)
    }

    /// Retrieves a customer with its ten most recent orders
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerDetail, ServiceError> {
        let db = &*self.db_pool;

        let customer = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Pelanggan tidak ditemukan".to_string()))?;

        let order_count = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let recent_orders = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .limit(10)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(CustomerDetail {
            customer,
            order_count,
            recent_orders,
        })
    }

    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn create_customer(
        &self,
        user_id: Uuid,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Nama pelanggan harus diisi".to_string(),
            ));
        }

        let now = Utc::now();
        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(customer_id = %created.id, "Customer created");

        self.activity
            .record(
                user_id,
                "CREATE_CUSTOMER",
                "customer",
                Some(created.id.to_string()),
                Some(json!({ "name": created.name })),
            )
            .await;

        Ok(created)
    }

    #[instrument(skip(self, input), fields(customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        user_id: Uuid,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        let existing = customer::Entity::find_by_id(customer_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Pelanggan tidak ditemukan".to_string()))?;

        let mut active: customer::ActiveModel = existing.into();
        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Nama pelanggan harus diisi".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone).filter(|p| !p.trim().is_empty()));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address).filter(|a| !a.trim().is_empty()));
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        self.activity
            .record(
                user_id,
                "UPDATE_CUSTOMER",
                "customer",
                Some(customer_id.to_string()),
                None,
            )
            .await;

        Ok(updated)
    }
}
