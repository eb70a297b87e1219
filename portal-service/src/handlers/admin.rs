use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use portal_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::admin::{
        CreateInviteRequest, CreateInviteResponse, CreatePropertyRequest, IssuedCredentials,
        OverviewResponse, ProvisionRequest, ProvisionResponse,
    },
    utils::ValidatedJson,
    AppState,
};

/// Provision a new account with fresh credentials
#[utoipa::path(
    post,
    path = "/admin/provision",
    request_body = ProvisionRequest,
    responses(
        (status = 200, description = "Account provisioned; credentials returned exactly once", body = ProvisionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn provision(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ProvisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = state.admin.provision(&req.role, req.name, req.email).await?;

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

/// Approve a pending or rejected account
#[utoipa::path(
    post,
    path = "/admin/accounts/{account_id}/approve",
    params(("account_id" = Uuid, Path, description = "Account to approve")),
    responses(
        (status = 200, description = "Account approved"),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn approve_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.onboarding.approve(account_id).await?;
    Ok((StatusCode::OK, Json(account)))
}

/// Reject a pending account
#[utoipa::path(
    post,
    path = "/admin/accounts/{account_id}/reject",
    params(("account_id" = Uuid, Path, description = "Account to reject")),
    responses(
        (status = 200, description = "Account rejected"),
        (status = 400, description = "Account cannot be rejected", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn reject_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.onboarding.reject(account_id).await?;
    Ok((StatusCode::OK, Json(account)))
}

/// Issue a standing invite
#[utoipa::path(
    post,
    path = "/admin/invites",
    request_body = CreateInviteRequest,
    responses(
        (status = 201, description = "Invite issued; token returned exactly once", body = CreateInviteResponse),
        (status = 400, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn create_invite(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (invite, token) = state
        .admin
        .issue_invite(req.email, &req.role, req.org_ref, req.expires_in_hours)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateInviteResponse {
            invite_id: invite.invite_id,
            invite_token: token,
        }),
    ))
}

/// List all invites
#[utoipa::path(
    get,
    path = "/admin/invites",
    responses((status = 200, description = "All invites, newest first")),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn list_invites(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let invites = state.admin.list_invites().await?;
    Ok((StatusCode::OK, Json(invites)))
}

/// Revoke a standing invite
#[utoipa::path(
    delete,
    path = "/admin/invites/{invite_id}",
    params(("invite_id" = Uuid, Path, description = "Invite to revoke")),
    responses(
        (status = 200, description = "Invite revoked"),
        (status = 404, description = "Invite not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn revoke_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invite = state.admin.revoke_invite(invite_id).await?;
    Ok((StatusCode::OK, Json(invite)))
}

/// Cached aggregate counts for the admin landing page
#[utoipa::path(
    get,
    path = "/admin/overview",
    responses((status = 200, description = "Aggregate counts", body = OverviewResponse)),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn overview(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let counts = state.admin.overview().await?;
    Ok((StatusCode::OK, Json(OverviewResponse::from(counts))))
}

/// Add a property to the catalog
#[utoipa::path(
    post,
    path = "/admin/properties",
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Property created", body = PropertyResponse),
        (status = 400, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn create_property(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let property = state
        .catalog
        .create_property(req.title, req.location, req.price_cents)
        .await?;

    Ok((StatusCode::CREATED, Json(property)))
}
