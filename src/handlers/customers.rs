use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::customers::{CreateCustomerInput, UpdateCustomerInput},
    ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/customers",
    summary = "List customers",
    params(("search" = Option<String>, Query, description = "Name or phone filter")),
    responses((status = 200, description = "Customers with their order counts"))
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListCustomersQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let customers = state
        .services
        .customers
        .list_customers(query.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(customers)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

pub async fn create_customer(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(payload): Json<CreateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customers
        .create_customer(actor.id, payload)
        .await?;
    Ok(Json(ApiResponse::success(customer)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state
        .services
        .customers
        .update_customer(actor.id, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(customer)))
}
