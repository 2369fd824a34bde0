//! Group membership and invite link models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Join record between an account and a group
///
/// At most one row exists per (account, group) pair. `active` stays false
/// until the user actually joins through their invite link.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub id: i64,
    pub group_id: i64,
    pub account_id: i64,
    pub active: bool,
    pub invite_link_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single-use invite link tracked locally to prevent duplicate issuance
///
/// `consumed_at` is null while the link is still usable. Link strings are
/// globally unique, not just unique per (account, group) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMemberInviteLink {
    pub id: i64,
    pub invite_link: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GroupMemberInviteLink {
    /// Whether the link can still be handed out
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && self.expires_at > now
    }
}
