//! PostgreSQL data access for the portal.
//!
//! One wrapper struct owning the pool, one method per query. Methods return
//! raw `sqlx::Error` so the service layer can pick apart constraint
//! violations (unique email, unique access id) into its own taxonomy.

use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::models::{Account, AccountStatus, Invite, Property};

/// Aggregate counts backing the admin overview view.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct OverviewCounts {
    pub pending_accounts: i64,
    pub active_accounts: i64,
    pub rejected_accounts: i64,
    pub available_properties: i64,
}

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ==================== Account Operations ====================

    /// Find account by its human-facing access identifier.
    pub async fn find_account_by_access_id(
        &self,
        access_id: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE access_id = $1")
            .bind(access_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find account by ID.
    pub async fn find_account_by_id(
        &self,
        account_id: Uuid,
    ) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Insert a new account.
    pub async fn insert_account(&self, account: &Account) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, access_id, full_name, email, access_key_hash,
                                  access_token_hash, token_consumed, role_code, status_code, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.account_id)
        .bind(&account.access_id)
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.access_key_hash)
        .bind(&account.access_token_hash)
        .bind(account.token_consumed)
        .bind(&account.role_code)
        .bind(&account.status_code)
        .bind(account.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Claim an account's one-time token: persist the holder's identity and
    /// flip `token_consumed` in one conditional update. Returns the number
    /// of rows affected - zero means a concurrent claim already won.
    pub async fn claim_enlistment(
        &self,
        account_id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET full_name = $1, email = $2, token_consumed = TRUE
            WHERE account_id = $3 AND token_consumed = FALSE
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Update an account's lifecycle status.
    pub async fn update_account_status(
        &self,
        account_id: Uuid,
        status: AccountStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET status_code = $1 WHERE account_id = $2")
            .bind(status.as_str())
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== Invite Operations ====================

    /// Insert a new invite.
    pub async fn insert_invite(&self, invite: &Invite) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO invites (invite_id, email, role_code, org_ref, token_hash,
                                 status_code, expiry_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(invite.invite_id)
        .bind(&invite.email)
        .bind(&invite.role_code)
        .bind(&invite.org_ref)
        .bind(&invite.token_hash)
        .bind(&invite.status_code)
        .bind(invite.expiry_utc)
        .bind(invite.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find invite by ID.
    pub async fn find_invite_by_id(&self, invite_id: Uuid) -> Result<Option<Invite>, sqlx::Error> {
        sqlx::query_as::<_, Invite>("SELECT * FROM invites WHERE invite_id = $1")
            .bind(invite_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find invite by its token digest.
    pub async fn find_invite_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Invite>, sqlx::Error> {
        sqlx::query_as::<_, Invite>("SELECT * FROM invites WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
    }

    /// List invites, newest first.
    pub async fn list_invites(&self) -> Result<Vec<Invite>, sqlx::Error> {
        sqlx::query_as::<_, Invite>("SELECT * FROM invites ORDER BY created_utc DESC")
            .fetch_all(&self.pool)
            .await
    }

    /// Update an invite's lifecycle status.
    pub async fn update_invite_status(
        &self,
        invite_id: Uuid,
        status: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE invites SET status_code = $1 WHERE invite_id = $2")
            .bind(status)
            .bind(invite_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== Property Operations ====================

    /// Insert a new property.
    pub async fn insert_property(&self, property: &Property) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO properties (property_id, title, location, price_cents, available, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(property.property_id)
        .bind(&property.title)
        .bind(&property.location)
        .bind(property.price_cents)
        .bind(property.available)
        .bind(property.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List available properties, newest first.
    pub async fn list_available_properties(&self) -> Result<Vec<Property>, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE available = TRUE ORDER BY created_utc DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Aggregate counts for the admin overview.
    pub async fn overview_counts(&self) -> Result<OverviewCounts, sqlx::Error> {
        sqlx::query_as::<_, OverviewCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM accounts WHERE status_code = 'pending') AS pending_accounts,
                (SELECT COUNT(*) FROM accounts WHERE status_code = 'active') AS active_accounts,
                (SELECT COUNT(*) FROM accounts WHERE status_code = 'rejected') AS rejected_accounts,
                (SELECT COUNT(*) FROM properties WHERE available = TRUE) AS available_properties
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn test_health_check() {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/portal_test".to_string());
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        let db = Database::new(pool);
        assert!(db.health_check().await.is_ok());
    }
}
