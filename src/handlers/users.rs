use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::users::{CreateUserInput, UpdateUserInput},
    ApiResponse, AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let users = state.services.users.list_users().await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.get_user(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    summary = "Create user",
    description = "Create a cashier or owner account. OWNER only.",
    responses(
        (status = 200, description = "Account created"),
        (status = 400, description = "Username already taken or invalid input"),
        (status = 403, description = "Not an owner")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(payload): Json<CreateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.create_user(actor.id, payload).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state
        .services
        .users
        .update_user(actor.id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn toggle_user_active(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.toggle_active(actor.id, id).await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.users.delete_user(actor.id, id).await?;
    Ok(Json(ApiResponse::<()>::message("Pengguna berhasil dihapus")))
}
