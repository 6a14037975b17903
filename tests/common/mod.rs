use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use laundry_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    entities::user,
    AppServices, AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "integration_test_secret_key_long_enough_for_validation";

/// In-process application over an in-memory sqlite database.
/// A single pooled connection keeps the database alive for the
/// lifetime of the test.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<DbPool>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout: Duration::from_secs(3600),
            ..Default::default()
        };
        let db_pool = Arc::new(
            db::establish_connection_with_config(&db_config)
                .await
                .expect("failed to open test database"),
        );
        db::run_migrations(&db_pool)
            .await
            .expect("failed to run migrations");

        seed_account(&db_pool, "owner", "owner123", "Pemilik", "OWNER").await;
        seed_account(&db_pool, "kasir", "kasir123", "Kasir Satu", "KASIR").await;

        let auth_service = Arc::new(AuthService::new(
            AuthConfig::new(TEST_JWT_SECRET.to_string(), Duration::from_secs(3600)),
            db_pool.clone(),
        ));

        let app_config = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "development".to_string(),
        );

        let services = AppServices::new(db_pool.clone(), auth_service.clone());
        let state = AppState {
            db: db_pool.clone(),
            config: app_config,
            services,
        };

        let router = laundry_api::app_router(state, auth_service);

        Self {
            router,
            db: db_pool,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json_body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json_body.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"]
            .as_str()
            .expect("login response missing token")
            .to_string()
    }

    pub async fn owner_token(&self) -> String {
        self.login("owner", "owner123").await
    }

    pub async fn kasir_token(&self) -> String {
        self.login("kasir", "kasir123").await
    }
}

async fn seed_account(db_pool: &Arc<DbPool>, username: &str, password: &str, name: &str, role: &str) {
    // Low cost keeps the test suite fast; production hashing uses cost 10
    let hash = bcrypt::hash(password, 4).expect("failed to hash password");
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(hash),
        name: Set(name.to_string()),
        email: Set(None),
        role: Set(role.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&**db_pool)
    .await
    .expect("failed to seed account");
}
