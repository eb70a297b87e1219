//! Account model - portal principals and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Admin,
    Client,
    Agent,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "admin",
            AccountRole::Client => "client",
            AccountRole::Agent => "agent",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AccountRole::Admin)
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(AccountRole::Admin),
            "client" => Ok(AccountRole::Client),
            "agent" => Ok(AccountRole::Agent),
            _ => Err(format!("Invalid account role: {}", s)),
        }
    }
}

/// Account lifecycle codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Active,
    Rejected,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Active => "active",
            AccountStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(AccountStatus::Pending),
            "active" => Ok(AccountStatus::Active),
            "rejected" => Ok(AccountStatus::Rejected),
            _ => Err(format!("Invalid account status: {}", s)),
        }
    }
}

/// Account entity. Secret material is stored hashed only; the plaintext
/// access key and token leave the system exactly once, at provisioning.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub account_id: Uuid,
    pub access_id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub access_key_hash: String,
    pub access_token_hash: Option<String>,
    pub token_consumed: bool,
    pub role_code: String,
    pub status_code: String,
    pub created_utc: DateTime<Utc>,
}

impl Account {
    pub fn new(
        access_id: String,
        role: AccountRole,
        status: AccountStatus,
        full_name: Option<String>,
        email: Option<String>,
        access_key_hash: String,
        access_token_hash: Option<String>,
    ) -> Self {
        Self {
            account_id: Uuid::new_v4(),
            access_id,
            full_name,
            email,
            access_key_hash,
            access_token_hash,
            token_consumed: false,
            role_code: role.as_str().to_string(),
            status_code: status.as_str().to_string(),
            created_utc: Utc::now(),
        }
    }

    pub fn role(&self) -> Option<AccountRole> {
        self.role_code.parse().ok()
    }

    pub fn status(&self) -> Option<AccountStatus> {
        self.status_code.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        self.status_code == AccountStatus::Active.as_str()
    }

    pub fn is_admin(&self) -> bool {
        self.role_code == AccountRole::Admin.as_str()
    }

    /// Convert to sanitized response (no hashed material).
    pub fn sanitized(&self) -> AccountResponse {
        AccountResponse::from(self.clone())
    }
}

/// Account response for API (without secret material).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub access_id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub token_consumed: bool,
    pub role: String,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            account_id: a.account_id,
            access_id: a.access_id,
            full_name: a.full_name,
            email: a.email,
            token_consumed: a.token_consumed,
            role: a.role_code,
            status: a.status_code,
            created_utc: a.created_utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_codes_round_trip() {
        for role in [AccountRole::Admin, AccountRole::Client, AccountRole::Agent] {
            assert_eq!(role.as_str().parse::<AccountRole>(), Ok(role));
        }
        assert!("owner".parse::<AccountRole>().is_err());
    }

    #[test]
    fn sanitized_response_drops_hashes() {
        let account = Account::new(
            "IP-ABCD2345".to_string(),
            AccountRole::Client,
            AccountStatus::Pending,
            None,
            None,
            "$argon2id$...".to_string(),
            Some("$argon2id$...".to_string()),
        );

        let json = serde_json::to_value(account.sanitized()).unwrap();
        assert!(json.get("accessKeyHash").is_none());
        assert!(json.get("accessTokenHash").is_none());
        assert_eq!(json["accessId"], "IP-ABCD2345");
    }
}
