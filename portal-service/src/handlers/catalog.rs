use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use portal_core::error::AppError;

use crate::AppState;

/// List available properties
#[utoipa::path(
    get,
    path = "/properties/available",
    responses((status = 200, description = "Available properties, newest first", body = [PropertyResponse])),
    tag = "Catalog"
)]
pub async fn available_properties(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let properties = state.catalog.available_properties().await?;
    Ok((StatusCode::OK, Json(properties)))
}
