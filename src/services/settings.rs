use crate::{
    db::DbPool,
    entities::settings,
    errors::ServiceError,
    services::activity::ActivityLogService,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Fixed primary key for the single settings row
const SETTINGS_ID: &str = "default-settings";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsInput {
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub receipt_footer: Option<String>,
    pub template: Option<String>,
    pub logo_url: Option<String>,
}

/// Shop profile used on receipts and report headers. A single row,
/// created with defaults the first time it is read.
#[derive(Clone)]
pub struct SettingsService {
    db_pool: Arc<DbPool>,
    activity: Arc<ActivityLogService>,
}

impl SettingsService {
    pub fn new(db_pool: Arc<DbPool>, activity: Arc<ActivityLogService>) -> Self {
        Self { db_pool, activity }
    }

    #[instrument(skip(self))]
    pub async fn get_settings(&self) -> Result<settings::Model, ServiceError> {
        let db = &*self.db_pool;

        if let Some(existing) = settings::Entity::find_by_id(SETTINGS_ID)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
        {
            return Ok(existing);
        }

        let model = settings::ActiveModel {
            id: Set(SETTINGS_ID.to_string()),
            business_name: Set("LaundryKu".to_string()),
            address: Set(None),
            phone: Set(None),
            receipt_footer: Set(Some(
                "Terima kasih telah menggunakan jasa kami!".to_string(),
            )),
            template: Set("simple".to_string()),
            logo_url: Set(None),
            updated_at: Set(Utc::now()),
        };

        model.insert(db).await.map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn update_settings(
        &self,
        user_id: Uuid,
        input: UpdateSettingsInput,
    ) -> Result<settings::Model, ServiceError> {
        let existing = self.get_settings().await?;
        let mut active: settings::ActiveModel = existing.into();

        if let Some(business_name) = input.business_name {
            let business_name = business_name.trim().to_string();
            if business_name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Nama usaha harus diisi".to_string(),
                ));
            }
            active.business_name = Set(business_name);
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address).filter(|a| !a.trim().is_empty()));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone).filter(|p| !p.trim().is_empty()));
        }
        if let Some(receipt_footer) = input.receipt_footer {
            active.receipt_footer = Set(Some(receipt_footer).filter(|f| !f.trim().is_empty()));
        }
        if let Some(template) = input.template {
            active.template = Set(template);
        }
        if let Some(logo_url) = input.logo_url {
            active.logo_url = Set(Some(logo_url).filter(|u| !u.trim().is_empty()));
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        self.activity
            .record(user_id, "UPDATE_SETTINGS", "settings", None, None)
            .await;

        Ok(updated)
    }
}
