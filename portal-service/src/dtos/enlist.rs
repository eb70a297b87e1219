use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnlistRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    #[schema(example = "IP-KQ7M2XWB")]
    pub user_id: String,

    #[validate(length(min = 1, message = "Access key is required"))]
    #[schema(example = "3f2a9bc1d4e5f60718293a4b5c6d7e8f")]
    pub access_key: String,

    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,

    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    #[schema(example = "Jordan Vale")]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jordan@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnlistResponse {
    #[schema(example = "Access request recorded; awaiting administrator approval")]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnlistStatusRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    #[schema(example = "IP-KQ7M2XWB")]
    pub user_id: String,

    #[validate(length(min = 1, message = "Access key is required"))]
    pub access_key: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnlistStatusResponse {
    #[schema(example = "pending")]
    pub status: String,
}
