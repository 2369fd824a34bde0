//! Chat platform API capability
//!
//! All Telegram calls made by the access-control core go through the
//! `ChatApi` trait so services receive the platform as an injected
//! collaborator instead of reaching for a global bot client. Tests swap in
//! a fake implementation.

use chrono::{DateTime, Utc};
use teloxide::payloads::CreateChatInviteLinkSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberKind, UserId};
use tracing::debug;
use crate::utils::errors::Result;

/// Administrator entry as reported by the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAdmin {
    pub telegram_user_id: i64,
    pub username: Option<String>,
    pub status: AdminStatus,
    pub can_invite_users: bool,
    pub can_restrict_members: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStatus {
    Owner,
    Administrator,
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Owner => "owner",
            AdminStatus::Administrator => "administrator",
        }
    }
}

impl ChatAdmin {
    /// Whether this entry carries the rights the bot needs to manage
    /// members: invite link creation and member removal
    pub fn can_manage_members(&self) -> bool {
        self.status == AdminStatus::Administrator
            && self.can_invite_users
            && self.can_restrict_members
    }
}

/// Chat platform operations consumed by the access-control core
#[allow(async_fn_in_trait)]
pub trait ChatApi {
    /// Fetch the live administrator list for a chat
    async fn get_administrators(&self, chat_id: i64) -> Result<Vec<ChatAdmin>>;

    /// Mint an invite link and return the link string
    async fn create_invite_link(
        &self,
        chat_id: i64,
        expires_at: DateTime<Utc>,
        member_limit: u32,
        creates_join_request: bool,
    ) -> Result<String>;

    /// Lift a ban or restriction on a user in a chat
    async fn unban_member(&self, chat_id: i64, telegram_user_id: i64) -> Result<()>;
}

/// Production `ChatApi` backed by the teloxide bot client
#[derive(Clone)]
pub struct TelegramApi {
    bot: Bot,
}

impl TelegramApi {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl ChatApi for TelegramApi {
    async fn get_administrators(&self, chat_id: i64) -> Result<Vec<ChatAdmin>> {
        let members = self.bot.get_chat_administrators(ChatId(chat_id)).await?;

        let admins = members
            .into_iter()
            .filter_map(|member| {
                let telegram_user_id = member.user.id.0 as i64;
                let username = member.user.username.clone();
                match member.kind {
                    ChatMemberKind::Owner(_) => Some(ChatAdmin {
                        telegram_user_id,
                        username,
                        status: AdminStatus::Owner,
                        can_invite_users: true,
                        can_restrict_members: true,
                    }),
                    ChatMemberKind::Administrator(admin) => Some(ChatAdmin {
                        telegram_user_id,
                        username,
                        status: AdminStatus::Administrator,
                        can_invite_users: admin.can_invite_users,
                        can_restrict_members: admin.can_restrict_members,
                    }),
                    _ => None,
                }
            })
            .collect();

        Ok(admins)
    }

    async fn create_invite_link(
        &self,
        chat_id: i64,
        expires_at: DateTime<Utc>,
        member_limit: u32,
        creates_join_request: bool,
    ) -> Result<String> {
        let link = self
            .bot
            .create_chat_invite_link(ChatId(chat_id))
            .expire_date(expires_at)
            .member_limit(member_limit)
            .creates_join_request(creates_join_request)
            .await?;

        debug!(chat_id = chat_id, expires_at = %expires_at, "Invite link created");
        Ok(link.invite_link)
    }

    async fn unban_member(&self, chat_id: i64, telegram_user_id: i64) -> Result<()> {
        self.bot
            .unban_chat_member(ChatId(chat_id), UserId(telegram_user_id as u64))
            .await?;

        Ok(())
    }
}
