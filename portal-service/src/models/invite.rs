//! Invite model - standing offers of access tied to an email and role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Invite state codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Sent,
    Accepted,
    Expired,
    Revoked,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Sent => "sent",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Expired => "expired",
            InviteStatus::Revoked => "revoked",
        }
    }
}

/// Invite entity. Only a digest of the invite token is persisted; the
/// plaintext is handed to the caller once, at issuance.
#[derive(Debug, Clone, FromRow)]
pub struct Invite {
    pub invite_id: Uuid,
    pub email: String,
    pub role_code: String,
    pub org_ref: Option<String>,
    pub token_hash: String,
    pub status_code: String,
    pub expiry_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl Invite {
    pub fn new(
        email: String,
        role_code: String,
        org_ref: Option<String>,
        token_hash: String,
        expiry_utc: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            invite_id: Uuid::new_v4(),
            email,
            role_code,
            org_ref,
            token_hash,
            status_code: InviteStatus::Sent.as_str().to_string(),
            expiry_utc,
            created_utc: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.expiry_utc, Some(expiry) if Utc::now() >= expiry)
    }

    /// Effective state: a `sent` invite past its expiry reads as expired.
    pub fn effective_status(&self) -> &'static str {
        if self.status_code == InviteStatus::Sent.as_str() && self.is_expired() {
            InviteStatus::Expired.as_str()
        } else {
            match self.status_code.as_str() {
                "accepted" => InviteStatus::Accepted.as_str(),
                "expired" => InviteStatus::Expired.as_str(),
                "revoked" => InviteStatus::Revoked.as_str(),
                _ => InviteStatus::Sent.as_str(),
            }
        }
    }
}

/// Invite response for API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub invite_id: Uuid,
    pub email: String,
    pub role: String,
    pub org_ref: Option<String>,
    pub status: String,
    pub expiry_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl From<Invite> for InviteResponse {
    fn from(i: Invite) -> Self {
        let status = i.effective_status().to_string();
        Self {
            invite_id: i.invite_id,
            email: i.email,
            role: i.role_code,
            org_ref: i.org_ref,
            status,
            expiry_utc: i.expiry_utc,
            created_utc: i.created_utc,
        }
    }
}
