use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    auth::OwnerUser, errors::ServiceError, services::settings::UpdateSettingsInput, ApiResponse,
    AppState,
};

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let settings = state.services.settings.get_settings().await?;
    Ok(Json(ApiResponse::success(settings)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    OwnerUser(actor): OwnerUser,
    Json(payload): Json<UpdateSettingsInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let settings = state
        .services
        .settings
        .update_settings(actor.id, payload)
        .await?;
    Ok(Json(ApiResponse::success(settings)))
}
