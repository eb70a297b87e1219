use portal_core::error::AppError;
use thiserror::Error;

/// Business-level error taxonomy. The externally visible set is deliberately
/// small: credential failures collapse into one opaque message so responses
/// cannot be used to enumerate accounts or distinguish which check failed.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Too many attempts, try again later")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access token has already been used")]
    TokenAlreadyUsed,

    #[error("Account is already active")]
    AccountAlreadyActive,

    #[error("Email address already in use")]
    EmailInUse,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Invite not found")]
    InviteNotFound,

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// True when `err` is a Postgres unique violation on the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return db_err.constraint() == Some(constraint)
                || db_err.message().contains(constraint);
        }
    }
    false
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::RateLimited { retry_after_secs } => AppError::TooManyRequests(
                "Too many attempts, try again later".to_string(),
                Some(retry_after_secs),
            ),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::TokenAlreadyUsed => {
                AppError::BadRequest(anyhow::anyhow!("Access token has already been used"))
            }
            ServiceError::AccountAlreadyActive => {
                AppError::BadRequest(anyhow::anyhow!("Account is already active"))
            }
            ServiceError::EmailInUse => {
                AppError::Conflict(anyhow::anyhow!("Email address already in use"))
            }
            ServiceError::AccountNotFound => {
                AppError::NotFound(anyhow::anyhow!("Account not found"))
            }
            ServiceError::InviteNotFound => {
                AppError::NotFound(anyhow::anyhow!("Invite not found"))
            }
            ServiceError::Store(e) => AppError::DatabaseError(anyhow::anyhow!(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
