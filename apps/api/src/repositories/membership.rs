//! Ecosystem membership repository

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::Ecosystem;

/// Per-ecosystem membership counts
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Number of membership rows `account_id` holds in `ecosystem`
    async fn count_memberships(
        &self,
        ecosystem: Ecosystem,
        account_id: &str,
    ) -> Result<i64, sqlx::Error>;
}

/// PostgreSQL-backed [`MembershipStore`]
#[derive(Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    /// Create a new repository over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipRepository {
    async fn count_memberships(
        &self,
        ecosystem: Ecosystem,
        account_id: &str,
    ) -> Result<i64, sqlx::Error> {
        // count_query is a static string chosen by the enum variant
        sqlx::query_scalar::<_, i64>(ecosystem.count_query())
            .bind(account_id)
            .fetch_one(&self.pool)
            .await
    }
}
