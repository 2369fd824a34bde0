//! Group member and invite link repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use crate::models::member::{GroupMember, GroupMemberInviteLink};
use crate::utils::errors::TokenGateError;

#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the newest unconsumed, unexpired invite link for an
    /// (account, group) member row
    pub async fn find_unconsumed_link(
        &self,
        group_id: i64,
        account_id: i64,
    ) -> Result<Option<GroupMemberInviteLink>, TokenGateError> {
        let link = sqlx::query_as::<_, GroupMemberInviteLink>(
            r#"
            SELECT l.id, l.invite_link, l.expires_at, l.consumed_at, l.created_at
            FROM group_member_invite_links l
            INNER JOIN group_members m ON m.invite_link_id = l.id
            WHERE m.group_id = $1
              AND m.account_id = $2
              AND l.consumed_at IS NULL
              AND l.expires_at > $3
            ORDER BY l.created_at DESC
            LIMIT 1
            "#
        )
        .bind(group_id)
        .bind(account_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    /// Upsert the member row and attach an invite link in one transaction
    ///
    /// The link row is connected by its globally-unique string or created
    /// fresh. The member row is created inactive; an existing row keeps its
    /// `active` state and only re-points the invite link relation.
    pub async fn attach_invite_link(
        &self,
        group_id: i64,
        account_id: i64,
        invite_link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<GroupMember, TokenGateError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Connect-or-create on the unique link string; the no-op DO UPDATE
        // makes RETURNING yield the row on conflict as well.
        let link = sqlx::query_as::<_, GroupMemberInviteLink>(
            r#"
            INSERT INTO group_member_invite_links (invite_link, expires_at, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (invite_link)
            DO UPDATE SET invite_link = EXCLUDED.invite_link
            RETURNING id, invite_link, expires_at, consumed_at, created_at
            "#
        )
        .bind(invite_link)
        .bind(expires_at)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            INSERT INTO group_members (group_id, account_id, active, invite_link_id, created_at, updated_at)
            VALUES ($1, $2, false, $3, $4, $4)
            ON CONFLICT (group_id, account_id)
            DO UPDATE SET invite_link_id = EXCLUDED.invite_link_id, updated_at = EXCLUDED.updated_at
            RETURNING id, group_id, account_id, active, invite_link_id, created_at, updated_at
            "#
        )
        .bind(group_id)
        .bind(account_id)
        .bind(link.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(member)
    }

    /// Mark a link consumed and activate its member row
    ///
    /// Returns false when the link is unknown or already consumed.
    pub async fn consume_link(&self, invite_link: &str, at: DateTime<Utc>) -> Result<bool, TokenGateError> {
        let mut tx = self.pool.begin().await?;

        let consumed: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE group_member_invite_links
            SET consumed_at = $2
            WHERE invite_link = $1 AND consumed_at IS NULL
            RETURNING id
            "#
        )
        .bind(invite_link)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((link_id,)) = consumed else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query("UPDATE group_members SET active = true, updated_at = $2 WHERE invite_link_id = $1")
            .bind(link_id)
            .bind(at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
