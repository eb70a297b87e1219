//! Administrative operations: credential provisioning, standing invites,
//! and the cached overview aggregate.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    models::{Account, AccountResponse, AccountRole, AccountStatus, Invite, InviteResponse, InviteStatus},
    services::{
        cache::{keys, ViewCache},
        database::OverviewCounts,
        error::is_unique_violation,
        Database, ServiceError,
    },
    utils::{
        digest_invite_token, generate_access_id, generate_access_key, generate_access_token,
        hash_secret,
    },
};

const DEFAULT_INVITE_EXPIRY_HOURS: i64 = 168; // 7 days

/// Freshly minted credentials. The plaintext key and token exist only in
/// this value; once it is dropped there is no recovery path.
#[derive(Debug)]
pub struct ProvisionedCredentials {
    pub account: AccountResponse,
    pub access_id: String,
    pub access_key: String,
    pub access_token: String,
}

#[derive(Clone)]
pub struct AdminService {
    db: Database,
    cache: Arc<dyn ViewCache>,
    overview_ttl_secs: u64,
}

impl AdminService {
    pub fn new(db: Database, cache: Arc<dyn ViewCache>, overview_ttl_secs: u64) -> Self {
        Self {
            db,
            cache,
            overview_ttl_secs,
        }
    }

    /// Mint an identifier / access key / one-time token triple.
    ///
    /// Only hashed forms are persisted; the plaintext goes back to the
    /// caller exactly once, for out-of-band delivery. Client accounts start
    /// `pending` and must be claimed and approved; other roles skip the
    /// onboarding step entirely.
    pub async fn provision(
        &self,
        role: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<ProvisionedCredentials, ServiceError> {
        let role: AccountRole = role
            .parse()
            .map_err(|e: String| ServiceError::Validation(e))?;

        let mut access_id = generate_access_id();
        for _ in 0..4 {
            if self
                .db
                .find_account_by_access_id(&access_id)
                .await?
                .is_none()
            {
                break;
            }
            access_id = generate_access_id();
        }

        let access_key = generate_access_key();
        let access_token = generate_access_token();

        let status = match role {
            AccountRole::Client => AccountStatus::Pending,
            _ => AccountStatus::Active,
        };

        let account = Account::new(
            access_id.clone(),
            role,
            status,
            name,
            email.map(|e| e.trim().to_lowercase()),
            hash_secret(&access_key).map_err(ServiceError::Internal)?,
            Some(hash_secret(&access_token).map_err(ServiceError::Internal)?),
        );

        self.db.insert_account(&account).await.map_err(|e| {
            if is_unique_violation(&e, "accounts_email_key") {
                ServiceError::EmailInUse
            } else {
                ServiceError::Store(e)
            }
        })?;

        self.cache.invalidate(&[keys::ADMIN_OVERVIEW]).await;

        tracing::info!(
            account_id = %account.account_id,
            access_id = %account.access_id,
            role = %account.role_code,
            "Account provisioned"
        );

        Ok(ProvisionedCredentials {
            account: account.sanitized(),
            access_id,
            access_key,
            access_token,
        })
    }

    /// Issue a standing invite for an email address. Returns the plaintext
    /// token exactly once; only its digest is stored.
    pub async fn issue_invite(
        &self,
        email: String,
        role: &str,
        org_ref: Option<String>,
        expires_in_hours: Option<i64>,
    ) -> Result<(InviteResponse, String), ServiceError> {
        let role: AccountRole = role
            .parse()
            .map_err(|e: String| ServiceError::Validation(e))?;

        let token = generate_access_token();
        let expiry_hours = expires_in_hours.unwrap_or(DEFAULT_INVITE_EXPIRY_HOURS);
        let expiry_utc = Some(Utc::now() + Duration::hours(expiry_hours));

        let invite = Invite::new(
            email.trim().to_lowercase(),
            role.as_str().to_string(),
            org_ref,
            digest_invite_token(&token),
            expiry_utc,
        );

        self.db.insert_invite(&invite).await?;

        tracing::info!(invite_id = %invite.invite_id, email = %invite.email, "Invite issued");

        Ok((InviteResponse::from(invite), token))
    }

    /// Accept a standing invite: provision an account for the invited email
    /// and role, and mark the invite accepted. The invite token is only
    /// usable while the invite is still `sent` and unexpired.
    pub async fn accept_invite(
        &self,
        token: &str,
        full_name: Option<String>,
    ) -> Result<ProvisionedCredentials, ServiceError> {
        let invite = self
            .db
            .find_invite_by_token_hash(&digest_invite_token(token))
            .await?
            .ok_or(ServiceError::InviteNotFound)?;

        if invite.effective_status() != InviteStatus::Sent.as_str() {
            return Err(ServiceError::Validation(
                "Invite is no longer valid".to_string(),
            ));
        }

        let issued = self
            .provision(&invite.role_code, full_name, Some(invite.email.clone()))
            .await?;

        self.db
            .update_invite_status(invite.invite_id, InviteStatus::Accepted.as_str())
            .await?;

        tracing::info!(
            invite_id = %invite.invite_id,
            account_id = %issued.account.account_id,
            "Invite accepted"
        );

        Ok(issued)
    }

    /// List all invites, newest first.
    pub async fn list_invites(&self) -> Result<Vec<InviteResponse>, ServiceError> {
        let invites = self.db.list_invites().await?;
        Ok(invites.into_iter().map(InviteResponse::from).collect())
    }

    /// Revoke a standing invite. Accepted invites stay accepted.
    pub async fn revoke_invite(&self, invite_id: Uuid) -> Result<InviteResponse, ServiceError> {
        let invite = self
            .db
            .find_invite_by_id(invite_id)
            .await?
            .ok_or(ServiceError::InviteNotFound)?;

        if invite.status_code == InviteStatus::Accepted.as_str() {
            return Err(ServiceError::Validation(
                "Accepted invites cannot be revoked".to_string(),
            ));
        }

        self.db
            .update_invite_status(invite_id, InviteStatus::Revoked.as_str())
            .await?;

        tracing::info!(invite_id = %invite_id, "Invite revoked");

        let mut response = InviteResponse::from(invite);
        response.status = InviteStatus::Revoked.as_str().to_string();
        Ok(response)
    }

    /// Aggregate counts for the admin overview, read through the cache.
    pub async fn overview(&self) -> Result<OverviewCounts, ServiceError> {
        if let Some(cached) = self.cache.get(keys::ADMIN_OVERVIEW).await {
            if let Ok(counts) = serde_json::from_value::<OverviewCounts>(cached) {
                return Ok(counts);
            }
        }

        let counts = self.db.overview_counts().await?;

        let value = serde_json::to_value(&counts).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Failed to serialize overview: {}", e))
        })?;
        self.cache
            .set(keys::ADMIN_OVERVIEW, &value, self.overview_ttl_secs)
            .await;

        Ok(counts)
    }
}
