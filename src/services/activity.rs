use crate::{db::DbPool, entities::activity_log};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Best-effort audit trail. A failed write must never fail the request
/// that triggered it, so errors are logged and swallowed here.
#[derive(Clone)]
pub struct ActivityLogService {
    db_pool: Arc<DbPool>,
}

impl ActivityLogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn record(
        &self,
        user_id: Uuid,
        action: &str,
        entity: &str,
        entity_id: Option<String>,
        details: Option<serde_json::Value>,
    ) {
        let model = activity_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            action: Set(action.to_string()),
            entity: Set(entity.to_string()),
            entity_id: Set(entity_id),
            details: Set(details.map(|v| v.to_string())),
            created_at: Set(Utc::now()),
        };

        if let Err(e) = model.insert(&*self.db_pool).await {
            warn!(error = %e, action = action, entity = entity, "Failed to write activity log entry");
        }
    }
}
