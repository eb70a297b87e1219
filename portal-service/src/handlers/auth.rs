use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use portal_core::error::AppError;
use portal_core::middleware::client_ip::ClientIp;

use crate::{
    dtos::auth::{LoginRequest, LoginResponse},
    utils::ValidatedJson,
    AppState,
};

/// Login with access id and access key
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    client_ip: ClientIp,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let grant = state
        .auth
        .authenticate(
            &req.identifier,
            &req.access_key,
            req.require_admin,
            &client_ip.as_key(),
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            session_token: grant.session_token,
            account_id: grant.account_id,
            role: grant.role,
            expires_in: grant.expires_in,
        }),
    ))
}
