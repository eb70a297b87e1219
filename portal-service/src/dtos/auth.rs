use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Identifier is required"))]
    #[schema(example = "IP-KQ7M2XWB")]
    pub identifier: String,

    #[validate(length(min = 1, message = "Access key is required"))]
    pub access_key: String,

    #[serde(default)]
    pub require_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_token: String,
    pub account_id: Uuid,
    #[schema(example = "client")]
    pub role: String,
    #[schema(example = 3600)]
    pub expires_in: i64,
}
