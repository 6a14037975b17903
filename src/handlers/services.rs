use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::OwnerUser,
    errors::ServiceError,
    services::catalog::{CreateServiceInput, UpdateServiceInput},
    ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListServicesQuery {
    /// Include soft-deleted entries, used by the catalog admin screen
    #[serde(default)]
    pub include_inactive: bool,
}

#[utoipa::path(
    get,
    path = "/api/services",
    summary = "List services",
    params(
        ("include_inactive" = Option<bool>, Query, description = "Include deactivated services")
    ),
    responses((status = 200, description = "Service catalog"))
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ListServicesQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let services = state
        .services
        .catalog
        .list_services(query.include_inactive)
        .await?;
    Ok(Json(ApiResponse::success(services)))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = state.services.catalog.get_service(id).await?;
    Ok(Json(ApiResponse::success(service)))
}

pub async fn create_service(
    State(state): State<AppState>,
    OwnerUser(actor): OwnerUser,
    Json(payload): Json<CreateServiceInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = state
        .services
        .catalog
        .create_service(actor.id, payload)
        .await?;
    Ok(Json(ApiResponse::success(service)))
}

pub async fn update_service(
    State(state): State<AppState>,
    OwnerUser(actor): OwnerUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let service = state
        .services
        .catalog
        .update_service(actor.id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(service)))
}

pub async fn delete_service(
    State(state): State<AppState>,
    OwnerUser(actor): OwnerUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.catalog.delete_service(actor.id, id).await?;
    Ok(Json(ApiResponse::<()>::message("Layanan berhasil dihapus")))
}
