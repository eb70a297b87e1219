//! Login: credential validation gated by three throttle dimensions.

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::RateLimitConfig,
    services::{
        rate_limit::SlidingWindowLimiter, Database, ServiceError, SessionService, WindowConfig,
    },
    utils::{normalize_secret, verify_secret},
};

/// Issued to the caller on successful login.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub session_token: String,
    pub account_id: Uuid,
    pub role: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    limiter: Arc<SlidingWindowLimiter>,
    sessions: SessionService,
    login_window: WindowConfig,
}

impl AuthService {
    pub fn new(
        db: Database,
        limiter: Arc<SlidingWindowLimiter>,
        sessions: SessionService,
        rate_limit: &RateLimitConfig,
    ) -> Self {
        Self {
            db,
            limiter,
            sessions,
            login_window: rate_limit.login.to_window(),
        }
    }

    /// Authenticate an access id / access key pair and issue a session claim.
    ///
    /// Attempts are throttled along three independent dimensions - the
    /// identifier, the calling address, and their pair - so neither
    /// credential stuffing across many accounts from one address nor
    /// distributed guessing against one account flies under a single
    /// counter. Every rejection is the same opaque failure; the true cause
    /// is logged server-side only.
    pub async fn authenticate(
        &self,
        access_id: &str,
        access_key: &str,
        require_admin: bool,
        client_ip: &str,
    ) -> Result<SessionGrant, ServiceError> {
        let normalized_id = normalize_secret(access_id);

        let id_key = format!("login:id:{}", normalized_id);
        let ip_key = format!("login:ip:{}", client_ip);
        let pair_key = format!("login:pair:{}:{}", normalized_id, client_ip);

        let decision = self
            .limiter
            .consume_many(&[&id_key, &ip_key, &pair_key], &self.login_window);
        if !decision.allowed {
            tracing::warn!(access_id = %normalized_id, ip = %client_ip, "Login attempt rate limited");
            return Err(ServiceError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            });
        }

        if normalized_id.is_empty() || access_key.trim().is_empty() {
            return Err(ServiceError::InvalidCredentials);
        }

        let account = self
            .db
            .find_account_by_access_id(&normalized_id)
            .await?
            .ok_or_else(|| {
                tracing::info!(access_id = %normalized_id, "Login failed: unknown access id");
                ServiceError::InvalidCredentials
            })?;

        if !account.is_active() {
            tracing::info!(account_id = %account.account_id, status = %account.status_code, "Login failed: account not active");
            return Err(ServiceError::InvalidCredentials);
        }

        if !verify_secret(access_key, &account.access_key_hash) {
            tracing::info!(account_id = %account.account_id, "Login failed: access key mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        if require_admin && !account.is_admin() {
            tracing::info!(account_id = %account.account_id, "Login failed: administrator required");
            return Err(ServiceError::InvalidCredentials);
        }

        // Clear the identifier and pair counters; the per-address counter
        // stays so one address that guessed a single account right is still
        // throttled while probing others.
        self.limiter.reset(&id_key);
        self.limiter.reset(&pair_key);

        let is_admin = account.is_admin();
        let session_token = self
            .sessions
            .issue(account.account_id, is_admin)
            .map_err(ServiceError::Internal)?;

        tracing::info!(account_id = %account.account_id, admin = is_admin, "Login succeeded");

        Ok(SessionGrant {
            session_token,
            account_id: account.account_id,
            role: if is_admin { "admin" } else { "client" }.to_string(),
            expires_in: self.sessions.ttl_seconds(),
        })
    }
}
