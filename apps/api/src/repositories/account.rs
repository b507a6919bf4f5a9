//! Account repository

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::Account;

/// Account lookups and activity tracking
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account by exact id
    ///
    /// # Returns
    /// * `Ok(Some(Account))` - If the account exists
    /// * `Ok(None)` - If no account with the given id exists
    /// * `Err(sqlx::Error)` - If a database error occurs
    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>, sqlx::Error>;

    /// Set `last_active_at` to the current time
    async fn touch_last_active(&self, account_id: &str) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed [`AccountStore`]
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new repository over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountRepository {
    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT
                id,
                username,
                email,
                is_active,
                last_active_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn touch_last_active(&self, account_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET last_active_at = NOW() WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
