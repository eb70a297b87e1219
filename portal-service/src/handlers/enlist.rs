use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use portal_core::error::AppError;
use portal_core::middleware::client_ip::ClientIp;

use crate::{
    dtos::admin::{AcceptInviteRequest, IssuedCredentials, ProvisionResponse},
    dtos::enlist::{EnlistRequest, EnlistResponse, EnlistStatusRequest, EnlistStatusResponse},
    services::AccessClaim,
    utils::ValidatedJson,
    AppState,
};

/// Claim an account with freshly issued credentials
#[utoipa::path(
    post,
    path = "/enlist",
    request_body = EnlistRequest,
    responses(
        (status = 200, description = "Access request recorded", body = EnlistResponse),
        (status = 400, description = "Validation error, token already used, or account already active", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Onboarding"
)]
pub async fn request_access(
    State(state): State<AppState>,
    client_ip: ClientIp,
    ValidatedJson(req): ValidatedJson<EnlistRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claim = AccessClaim {
        access_id: req.user_id,
        access_key: req.access_key,
        access_token: req.access_token,
        full_name: req.full_name,
        email: req.email,
    };

    state
        .onboarding
        .request_access(claim, &client_ip.as_key())
        .await?;

    Ok((
        StatusCode::OK,
        Json(EnlistResponse {
            message: "Access request recorded; awaiting administrator approval".to_string(),
        }),
    ))
}

/// Accept a standing invite and receive fresh credentials
#[utoipa::path(
    post,
    path = "/invites/accept",
    request_body = AcceptInviteRequest,
    responses(
        (status = 200, description = "Invite accepted; credentials returned exactly once", body = ProvisionResponse),
        (status = 400, description = "Invite no longer valid", body = ErrorResponse),
        (status = 404, description = "Invite not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    tag = "Onboarding"
)]
pub async fn accept_invite(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AcceptInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = state.admin.accept_invite(&req.token, req.full_name).await?;

    Ok((
        StatusCode::OK,
        Json(ProvisionResponse {
            account: issued.account,
            credentials: IssuedCredentials {
                user_id: issued.access_id,
                access_key: issued.access_key,
                access_token: issued.access_token,
            },
        }),
    ))
}

/// Check the lifecycle status of an account
#[utoipa::path(
    post,
    path = "/enlist/status",
    request_body = EnlistStatusRequest,
    responses(
        (status = 200, description = "Current account status", body = EnlistStatusResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Onboarding"
)]
pub async fn check_status(
    State(state): State<AppState>,
    client_ip: ClientIp,
    ValidatedJson(req): ValidatedJson<EnlistStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = state
        .onboarding
        .check_status(&req.user_id, &req.access_key, &client_ip.as_key())
        .await?;

    Ok((StatusCode::OK, Json(EnlistStatusResponse { status })))
}
