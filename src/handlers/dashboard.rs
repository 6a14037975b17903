use axum::{extract::State, response::IntoResponse, Json};

use crate::{errors::ServiceError, ApiResponse, AppState};

#[utoipa::path(
    get,
    path = "/api/dashboard/owner",
    summary = "Owner dashboard",
    description = "Revenue and volume aggregates across today, this month and this year. OWNER only.",
    responses(
        (status = 200, description = "Dashboard aggregates"),
        (status = 403, description = "Not an owner")
    )
)]
pub async fn owner_dashboard(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let dashboard = state.services.dashboard.owner_dashboard().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

pub async fn kasir_dashboard(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let dashboard = state.services.dashboard.kasir_dashboard().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}
