//! Account onboarding: one-time token claim and lifecycle approval.
//!
//! The holder of freshly provisioned credentials claims their identity
//! exactly once; an administrator then approves or rejects the account.

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::RateLimitConfig,
    models::{AccountResponse, AccountStatus},
    services::{
        cache::{keys, ViewCache},
        error::is_unique_violation,
        rate_limit::SlidingWindowLimiter,
        Database, ServiceError, WindowConfig,
    },
    utils::{normalize_secret, verify_secret},
};

/// Identity details presented alongside the one-time token.
#[derive(Debug, Clone)]
pub struct AccessClaim {
    pub access_id: String,
    pub access_key: String,
    pub access_token: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct OnboardingService {
    db: Database,
    limiter: Arc<SlidingWindowLimiter>,
    cache: Arc<dyn ViewCache>,
    enlist_window: WindowConfig,
    status_window: WindowConfig,
}

impl OnboardingService {
    pub fn new(
        db: Database,
        limiter: Arc<SlidingWindowLimiter>,
        cache: Arc<dyn ViewCache>,
        rate_limit: &RateLimitConfig,
    ) -> Self {
        Self {
            db,
            limiter,
            cache,
            enlist_window: rate_limit.enlist.to_window(),
            status_window: rate_limit.status.to_window(),
        }
    }

    /// Claim an account with a one-time access token.
    ///
    /// Wrong identifier, wrong key, and wrong token all fail with the same
    /// opaque error. The claim itself is a conditional update keyed on
    /// `token_consumed`, so of N concurrent requests presenting the same
    /// valid token exactly one lands.
    pub async fn request_access(
        &self,
        claim: AccessClaim,
        client_ip: &str,
    ) -> Result<(), ServiceError> {
        let normalized_id = normalize_secret(&claim.access_id);
        let throttle_key = format!("enlist:{}:{}", normalized_id, client_ip);

        let decision = self.limiter.consume(&throttle_key, &self.enlist_window);
        if !decision.allowed {
            tracing::warn!(access_id = %normalized_id, ip = %client_ip, "Enlistment attempt rate limited");
            return Err(ServiceError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            });
        }

        let account = self
            .db
            .find_account_by_access_id(&normalized_id)
            .await?
            .ok_or_else(|| {
                tracing::info!(access_id = %normalized_id, "Enlistment failed: unknown access id");
                ServiceError::InvalidCredentials
            })?;

        if !verify_secret(&claim.access_key, &account.access_key_hash) {
            tracing::info!(account_id = %account.account_id, "Enlistment failed: access key mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        let token_hash = account.access_token_hash.as_deref().unwrap_or_default();
        if !verify_secret(&claim.access_token, token_hash) {
            tracing::info!(account_id = %account.account_id, "Enlistment failed: access token mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        if account.token_consumed {
            return Err(ServiceError::TokenAlreadyUsed);
        }
        if account.is_active() {
            return Err(ServiceError::AccountAlreadyActive);
        }

        let email = claim.email.trim().to_lowercase();
        let rows = self
            .db
            .claim_enlistment(account.account_id, claim.full_name.trim(), &email)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "accounts_email_key") {
                    ServiceError::EmailInUse
                } else {
                    ServiceError::Store(e)
                }
            })?;

        // Zero rows: a concurrent claim flipped the flag between our read
        // and this update.
        if rows == 0 {
            return Err(ServiceError::TokenAlreadyUsed);
        }

        // A successful, intended use should not count against later
        // legitimate attempts.
        self.limiter.reset(&throttle_key);

        self.cache.invalidate(&[keys::ADMIN_OVERVIEW]).await;

        tracing::info!(account_id = %account.account_id, "Enlistment claim recorded, awaiting approval");
        Ok(())
    }

    /// Report an account's lifecycle status to a caller who can prove
    /// possession of the access key.
    pub async fn check_status(
        &self,
        access_id: &str,
        access_key: &str,
        client_ip: &str,
    ) -> Result<String, ServiceError> {
        let normalized_id = normalize_secret(access_id);
        let throttle_key = format!("status:{}:{}", normalized_id, client_ip);

        let decision = self.limiter.consume(&throttle_key, &self.status_window);
        if !decision.allowed {
            return Err(ServiceError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            });
        }

        let account = self
            .db
            .find_account_by_access_id(&normalized_id)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_secret(access_key, &account.access_key_hash) {
            return Err(ServiceError::InvalidCredentials);
        }

        self.limiter.reset(&throttle_key);

        Ok(account.status_code)
    }

    /// Approve an account: `pending -> active`, with `rejected -> active`
    /// re-activation allowed. Approving an active account is a no-op.
    pub async fn approve(&self, account_id: Uuid) -> Result<AccountResponse, ServiceError> {
        let account = self
            .db
            .find_account_by_id(account_id)
            .await?
            .ok_or(ServiceError::AccountNotFound)?;

        if account.is_active() {
            return Ok(account.sanitized());
        }

        self.db
            .update_account_status(account_id, AccountStatus::Active)
            .await?;
        self.cache.invalidate(&[keys::ADMIN_OVERVIEW]).await;

        tracing::info!(account_id = %account_id, "Account approved");

        let mut response = account.sanitized();
        response.status = AccountStatus::Active.as_str().to_string();
        Ok(response)
    }

    /// Reject a pending account. Active accounts cannot be rejected;
    /// rejecting an already rejected account is a no-op.
    pub async fn reject(&self, account_id: Uuid) -> Result<AccountResponse, ServiceError> {
        let account = self
            .db
            .find_account_by_id(account_id)
            .await?
            .ok_or(ServiceError::AccountNotFound)?;

        match account.status() {
            Some(AccountStatus::Rejected) => return Ok(account.sanitized()),
            Some(AccountStatus::Active) => {
                return Err(ServiceError::Validation(
                    "Active accounts cannot be rejected".to_string(),
                ));
            }
            _ => {}
        }

        self.db
            .update_account_status(account_id, AccountStatus::Rejected)
            .await?;
        self.cache.invalidate(&[keys::ADMIN_OVERVIEW]).await;

        tracing::info!(account_id = %account_id, "Account rejected");

        let mut response = account.sanitized();
        response.status = AccountStatus::Rejected.as_str().to_string();
        Ok(response)
    }
}
