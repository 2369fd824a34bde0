//! Group repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::group::{Group, CreateGroupRequest};
use crate::utils::errors::TokenGateError;

#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a group or reactivate the existing row for this chat
    pub async fn upsert(&self, request: CreateGroupRequest) -> Result<Group, TokenGateError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (chat_id, name, is_active, created_at, updated_at)
            VALUES ($1, $2, true, $3, $3)
            ON CONFLICT (chat_id)
            DO UPDATE SET is_active = true, updated_at = EXCLUDED.updated_at
            RETURNING id, chat_id, name, is_active, created_at, updated_at
            "#
        )
        .bind(request.chat_id)
        .bind(request.name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    /// Find group by Telegram chat ID
    pub async fn find_by_chat_id(&self, chat_id: i64) -> Result<Option<Group>, TokenGateError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, chat_id, name, is_active, created_at, updated_at FROM groups WHERE chat_id = $1"
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Update the stored display name for a chat
    ///
    /// No-op when the chat is not tracked.
    pub async fn rename(&self, chat_id: i64, name: &str) -> Result<(), TokenGateError> {
        sqlx::query("UPDATE groups SET name = $2, updated_at = $3 WHERE chat_id = $1")
            .bind(chat_id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Mark a group as deactivated by its chat ID
    ///
    /// Unknown chat IDs are a fail-soft no-op so reconciliation flows
    /// never crash on untracked chats.
    pub async fn deactivate(&self, chat_id: i64) -> Result<(), TokenGateError> {
        let result = sqlx::query("UPDATE groups SET is_active = false, updated_at = $2 WHERE chat_id = $1")
            .bind(chat_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!(chat_id = chat_id, "Group deactivated");
        }

        Ok(())
    }
}
