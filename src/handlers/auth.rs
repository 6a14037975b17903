use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::{auth::AuthUser, errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    summary = "Login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ServiceError::ValidationError(
            "Username dan password harus diisi".to_string(),
        ));
    }

    let user = state
        .services
        .auth
        .verify_credentials(username, &payload.password)
        .await?;
    let token = state.services.auth.generate_token(&user)?;

    state
        .services
        .activity
        .record(
            user.id,
            "LOGIN",
            "user",
            Some(user.id.to_string()),
            Some(json!({ "username": user.username })),
        )
        .await;

    let response = LoginResponse {
        token,
        user: AuthUser {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
        },
    };

    Ok(Json(ApiResponse::success(response)))
}

/// The current account, as resolved by the auth middleware
pub async fn me(user: AuthUser) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(user)))
}

/// Stateless tokens cannot be revoked; logout only records the event
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .activity
        .record(user.id, "LOGOUT", "user", Some(user.id.to_string()), None)
        .await;

    Ok(Json(ApiResponse::<()>::message("Berhasil keluar")))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .users
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::<()>::message("Password berhasil diubah")))
}
