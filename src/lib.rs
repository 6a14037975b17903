pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use axum::{
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;
pub use crate::handlers::AppServices;

/// Shared application state passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub services: AppServices,
}

/// Response envelope used by every JSON endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

/// Everything under /api. Route groups carry their own auth layers, so
/// the returned router only needs the AuthService extension installed.
pub fn api_routes() -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(handlers::auth::login));

    let authenticated = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/change-password", post(handlers::auth::change_password))
        .route(
            "/services",
            get(handlers::services::list_services).post(handlers::services::create_service),
        )
        .route(
            "/services/:id",
            get(handlers::services::get_service)
                .put(handlers::services::update_service)
                .delete(handlers::services::delete_service),
        )
        .route("/customers", get(handlers::customers::list_customers))
        .route("/customers", post(handlers::customers::create_customer))
        .route("/customers/:id", get(handlers::customers::get_customer))
        .route("/customers/:id", put(handlers::customers::update_customer))
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route(
            "/orders/:id/payment",
            put(handlers::orders::update_order_payment),
        )
        .route(
            "/orders/:id/receipt",
            get(handlers::orders::get_order_receipt),
        )
        .route("/dashboard/kasir", get(handlers::dashboard::kasir_dashboard))
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .with_auth();

    let owner_only = Router::new()
        .route("/users", get(handlers::users::list_users))
        .route("/users", post(handlers::users::create_user))
        .route("/users/:id", get(handlers::users::get_user))
        .route("/users/:id", put(handlers::users::update_user))
        .route("/users/:id", delete(handlers::users::delete_user))
        .route(
            "/users/:id/toggle-active",
            patch(handlers::users::toggle_user_active),
        )
        .route("/dashboard/owner", get(handlers::dashboard::owner_dashboard))
        .route("/reports/daily", get(handlers::reports::daily_report))
        .route("/reports/monthly", get(handlers::reports::monthly_report))
        .route("/reports/yearly", get(handlers::reports::yearly_report))
        .route("/reports/custom", get(handlers::reports::custom_report))
        .route(
            "/reports/export/excel",
            get(handlers::reports::export_excel),
        )
        .route("/reports/export/pdf", get(handlers::reports::export_pdf))
        .with_owner();

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(owner_only)
}

/// Full application router: API under /api plus the Swagger UI
pub fn app_router(state: AppState, auth_service: Arc<auth::AuthService>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .merge(openapi::swagger_routes())
        .layer(axum::Extension(auth_service))
        .with_state(state)
}
