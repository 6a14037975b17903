use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::orders::{CreateOrderInput, OrderDetail, OrderListFilter},
    ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: String,
    pub payment_method: Option<String>,
}

/// Order detail bundled with the shop profile, enough to render a
/// printable receipt in one request
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub order: OrderDetail,
    pub settings: crate::entities::settings::Model,
}

#[utoipa::path(
    get,
    path = "/api/orders",
    summary = "List orders",
    params(
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("payment_status" = Option<String>, Query, description = "Filter by payment status"),
        ("search" = Option<String>, Query, description = "Order number, customer name or phone"),
        ("start_date" = Option<String>, Query, description = "Creation date from (YYYY-MM-DD)"),
        ("end_date" = Option<String>, Query, description = "Creation date to, inclusive"),
        ("limit" = Option<u64>, Query, description = "Max rows, default 50")
    ),
    responses((status = 200, description = "Orders, newest first"))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state
        .services
        .orders
        .list_orders(OrderListFilter {
            status: query.status,
            payment_status: query.payment_status,
            search: query.search,
            start_date: query.start_date,
            end_date: query.end_date,
            limit: query.limit,
        })
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    summary = "Create order",
    description = "Create an order for an existing or inline walk-in customer",
    responses(
        (status = 200, description = "Order created with its items and initial status"),
        (status = 400, description = "No items, or the customer is missing")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(user.id, payload).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .update_status(id, &payload.status, user.id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn update_order_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .update_payment(
            id,
            &payload.payment_status,
            payload.payment_method.as_deref(),
            user.id,
        )
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Receipt view, usually opened in a new tab with a `?token=` parameter
pub async fn get_order_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    let settings = state.services.settings.get_settings().await?;
    Ok(Json(ApiResponse::success(ReceiptResponse {
        order,
        settings,
    })))
}
