use crate::{
    auth::AuthService,
    db::DbPool,
    entities::user,
    errors::ServiceError,
    models::{self, Role},
    services::activity::ActivityLogService,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// Account management, OWNER only. Accounts are never hard deleted;
/// "delete" deactivates so the activity log keeps valid references.
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    auth: Arc<AuthService>,
    activity: Arc<ActivityLogService>,
}

impl UserService {
    pub fn new(
        db_pool: Arc<DbPool>,
        auth: Arc<AuthService>,
        activity: Arc<ActivityLogService>,
    ) -> Self {
        Self {
            db_pool,
            auth,
            activity,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<user::Model>, ServiceError> {
        user::Entity::find()
            .order_by_asc(user::Column::Username)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Pengguna tidak ditemukan".to_string()))
    }

    #[instrument(skip(self, input), fields(actor_id = %actor_id))]
    pub async fn create_user(
        &self,
        actor_id: Uuid,
        input: CreateUserInput,
    ) -> Result<user::Model, ServiceError> {
        let username = input.username.trim();
        if username.is_empty() || input.password.is_empty() || input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Username, password dan nama harus diisi".to_string(),
            ));
        }
        if input.password.len() < 6 {
            return Err(ServiceError::ValidationError(
                "Password minimal 6 karakter".to_string(),
            ));
        }

        let role = match input.role.as_deref() {
            Some(raw) => models::parse_role(raw)?,
            None => Role::Kasir,
        };

        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            > 0;
        if taken {
            return Err(ServiceError::ValidationError(
                "Username sudah digunakan".to_string(),
            ));
        }

        let password_hash = self.auth.hash_password(&input.password)?;
        let now = Utc::now();

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email),
            role: Set(role.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model
            .insert(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(user_id = %created.id, username = %created.username, "User created");

        self.activity
            .record(
                actor_id,
                "CREATE_USER",
                "user",
                Some(created.id.to_string()),
                Some(json!({ "username": created.username, "role": created.role })),
            )
            .await;

        Ok(created)
    }

    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn update_user(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> Result<user::Model, ServiceError> {
        let existing = self.get_user(user_id).await?;
        let mut active: user::ActiveModel = existing.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Nama harus diisi".to_string(),
                ));
            }
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email).filter(|e| !e.trim().is_empty()));
        }
        if let Some(raw) = input.role {
            let role = models::parse_role(&raw)?;
            active.role = Set(role.to_string());
        }
        if let Some(password) = input.password {
            if password.len() < 6 {
                return Err(ServiceError::ValidationError(
                    "Password minimal 6 karakter".to_string(),
                ));
            }
            active.password_hash = Set(self.auth.hash_password(&password)?);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        self.activity
            .record(
                actor_id,
                "UPDATE_USER",
                "user",
                Some(user_id.to_string()),
                None,
            )
            .await;

        Ok(updated)
    }

    /// Toggles the active flag. Owners cannot lock themselves out.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn toggle_active(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
    ) -> Result<user::Model, ServiceError> {
        if actor_id == user_id {
            return Err(ServiceError::ValidationError(
                "Tidak dapat menonaktifkan akun sendiri".to_string(),
            ));
        }

        let existing = self.get_user(user_id).await?;
        let next_state = !existing.is_active;
        let mut active: user::ActiveModel = existing.into();
        active.is_active = Set(next_state);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        self.activity
            .record(
                actor_id,
                "TOGGLE_USER_ACTIVE",
                "user",
                Some(user_id.to_string()),
                Some(json!({ "is_active": updated.is_active })),
            )
            .await;

        Ok(updated)
    }

    /// Deletion deactivates the account instead of removing the row
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_user(&self, actor_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        if actor_id == user_id {
            return Err(ServiceError::ValidationError(
                "Tidak dapat menghapus akun sendiri".to_string(),
            ));
        }

        let existing = self.get_user(user_id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        self.activity
            .record(
                actor_id,
                "DELETE_USER",
                "user",
                Some(user_id.to_string()),
                None,
            )
            .await;

        Ok(())
    }

    /// Password change for the logged-in account. Requires the current
    /// password to match.
    #[instrument(skip(self, current_password, new_password), fields(user_id = %user_id))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if new_password.len() < 6 {
            return Err(ServiceError::ValidationError(
                "Password baru minimal 6 karakter".to_string(),
            ));
        }

        let existing = self.get_user(user_id).await?;

        let valid = bcrypt::verify(current_password, &existing.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        if !valid {
            return Err(ServiceError::ValidationError(
                "Password lama tidak sesuai".to_string(),
            ));
        }

        let mut active: user::ActiveModel = existing.into();
        active.password_hash = Set(self.auth.hash_password(new_password)?);
        active.updated_at = Set(Utc::now());
        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        self.activity
            .record(user_id, "CHANGE_PASSWORD", "user", Some(user_id.to_string()), None)
            .await;

        Ok(())
    }
}
