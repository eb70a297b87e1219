use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::AccountResponse;
use crate::services::OverviewCounts;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    #[validate(length(min = 1, message = "Role is required"))]
    #[schema(example = "client")]
    pub role: String,

    #[validate(length(max = 200, message = "Name too long"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// The one and only response carrying plaintext credentials.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredentials {
    #[schema(example = "IP-KQ7M2XWB")]
    pub user_id: String,
    pub access_key: String,
    pub access_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProvisionResponse {
    pub account: AccountResponse,
    pub credentials: IssuedCredentials,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "investor@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Role is required"))]
    #[schema(example = "client")]
    pub role: String,

    pub org_ref: Option<String>,

    #[validate(range(min = 1, max = 8760, message = "Expiry must be 1 hour to 1 year"))]
    pub expires_in_hours: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteResponse {
    pub invite_id: Uuid,
    /// Returned exactly once; only a digest is stored.
    pub invite_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInviteRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(max = 200, message = "Name too long"))]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    #[schema(example = "Dockside Lofts, Unit 4B")]
    pub title: String,

    #[validate(length(min = 1, max = 200, message = "Location is required"))]
    #[schema(example = "Rotterdam")]
    pub location: String,

    #[schema(example = 42_500_000)]
    pub price_cents: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub pending_accounts: i64,
    pub active_accounts: i64,
    pub rejected_accounts: i64,
    pub available_properties: i64,
}

impl From<OverviewCounts> for OverviewResponse {
    fn from(c: OverviewCounts) -> Self {
        Self {
            pending_accounts: c.pending_accounts,
            active_accounts: c.active_accounts,
            rejected_accounts: c.rejected_accounts,
            available_properties: c.available_properties,
        }
    }
}
