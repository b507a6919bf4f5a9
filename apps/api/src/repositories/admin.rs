//! Admin repository

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::AdminRecord;

/// Admin lookups and login tracking
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Find an admin by exact id
    async fn find_by_id(&self, admin_id: &str) -> Result<Option<AdminRecord>, sqlx::Error>;

    /// Set `last_login_at` to the current time
    async fn touch_last_login(&self, admin_id: &str) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed [`AdminStore`]
#[derive(Clone)]
pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    /// Create a new repository over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for PgAdminRepository {
    async fn find_by_id(&self, admin_id: &str) -> Result<Option<AdminRecord>, sqlx::Error> {
        sqlx::query_as::<_, AdminRecord>(
            r#"
            SELECT
                id,
                access_level,
                COALESCE(permissions, '{}'::jsonb) AS permissions
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn touch_last_login(&self, admin_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE admins SET last_login_at = NOW() WHERE id = $1")
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
