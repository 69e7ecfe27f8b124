//! Revoked token registry.
//!
//! Stores blacklisted jtis together with the token's natural expiry so rows
//! can be purged once the token would have died anyway. Consulted during
//! refresh, sliding refresh, and verify when the blacklist is enabled.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct BlacklistStore {
    pool: SqlitePool,
}

impl BlacklistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Blacklist a token by its jti. `expires_at` is the token's own hard
    /// expiry (Unix seconds). Inserting an already-blacklisted jti is a
    /// no-op.
    pub async fn insert(&self, jti: &str, expires_at: u64) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO blacklisted_tokens (jti, expires_at) VALUES (?, ?)")
            .bind(jti)
            .bind(expires_at as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Check whether a jti has been blacklisted.
    pub async fn contains(&self, jti: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM blacklisted_tokens WHERE jti = ?")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 > 0)
    }

    /// Delete entries whose tokens have passed their natural expiry.
    /// Returns the number of rows removed.
    pub async fn delete_expired(&self, now: u64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blacklisted_tokens WHERE expires_at <= ?")
            .bind(now as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
