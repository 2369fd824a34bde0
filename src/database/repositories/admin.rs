//! Group admin repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::utils::errors::TokenGateError;

#[derive(Debug, Clone)]
pub struct GroupAdminRepository {
    pool: PgPool,
}

impl GroupAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace the stored admin roster for a group with a freshly fetched one
    ///
    /// Reconciliation, not additive-only sync: admins absent from the new
    /// roster are removed.
    pub async fn replace(&self, group_id: i64, admins: &[(i64, String)]) -> Result<(), TokenGateError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM group_admins WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        for (telegram_user_id, status) in admins {
            sqlx::query(
                r#"
                INSERT INTO group_admins (group_id, telegram_user_id, status, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (group_id, telegram_user_id)
                DO UPDATE SET status = EXCLUDED.status, updated_at = EXCLUDED.updated_at
                "#
            )
            .bind(group_id)
            .bind(telegram_user_id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Check if a Telegram user is recorded as admin of a group
    pub async fn is_admin(&self, group_id: i64, telegram_user_id: i64) -> Result<bool, TokenGateError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM group_admins WHERE group_id = $1 AND telegram_user_id = $2"
        )
        .bind(group_id)
        .bind(telegram_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0 > 0)
    }
}
