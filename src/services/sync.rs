//! Admin sync service implementation
//!
//! Reconciles a managed group's stored admin roster against the live list
//! fetched from the chat platform and verifies the bot's own standing. A
//! bot without management rights cannot serve invites, so the group is
//! deactivated on the spot.

use tracing::{info, debug};
use crate::models::group::Group;
use crate::services::telegram::{ChatApi, ChatAdmin};
use crate::utils::errors::Result;
use crate::utils::logging::log_sync_result;

/// Store operations the admin sync service depends on
#[allow(async_fn_in_trait)]
pub trait SyncStore {
    /// Create the group row for a chat or reactivate the existing one
    async fn upsert_group(&self, chat_id: i64, name: &str) -> Result<Group>;

    /// Replace the stored admin roster wholesale with the fetched one
    async fn replace_group_admins(&self, group_id: i64, admins: &[ChatAdmin]) -> Result<()>;

    /// Update the stored display name for a chat
    async fn rename_group(&self, chat_id: i64, name: &str) -> Result<()>;

    /// Flag a group as deactivated; unknown chats are a no-op
    async fn deactivate_group(&self, chat_id: i64) -> Result<()>;
}

/// Outcome of an admin sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Bot holds management rights; roster and group name are up to date
    Synced { admin_count: usize },
    /// Bot is missing, demoted, or lacks member-management permissions;
    /// the group has been deactivated and the caller must not proceed
    BotNotAdmin,
}

/// Admin sync service reconciling group admin state
#[derive(Clone)]
pub struct AdminSyncService<A, S> {
    api: A,
    store: S,
    bot_user_id: i64,
}

impl<A: ChatApi, S: SyncStore> AdminSyncService<A, S> {
    pub fn new(api: A, store: S, bot_user_id: i64) -> Self {
        Self {
            api,
            store,
            bot_user_id,
        }
    }

    /// Refresh the group's admin roster and verify the bot's own standing
    ///
    /// The fetched roster replaces the stored one wholesale. The sync only
    /// succeeds when the bot is listed as administrator with invite-link
    /// and member-removal rights; anything else, including the bot missing
    /// from the list entirely, deactivates the group.
    pub async fn sync_admins(&self, chat_id: i64, title: &str) -> Result<SyncOutcome> {
        debug!(chat_id = chat_id, "Starting admin sync");

        let group = self.store.upsert_group(chat_id, title).await?;
        let admins = self.api.get_administrators(chat_id).await?;
        self.store.replace_group_admins(group.id, &admins).await?;

        let me = admins
            .iter()
            .find(|admin| admin.telegram_user_id == self.bot_user_id);

        match me {
            Some(me) if me.can_manage_members() => {
                self.store.rename_group(chat_id, title).await?;
                log_sync_result(chat_id, admins.len(), true);
                Ok(SyncOutcome::Synced {
                    admin_count: admins.len(),
                })
            }
            _ => {
                self.store.deactivate_group(chat_id).await?;
                log_sync_result(chat_id, admins.len(), false);
                Ok(SyncOutcome::BotNotAdmin)
            }
        }
    }

    /// Update the stored group name after a chat title change
    pub async fn rename_group(&self, chat_id: i64, title: &str) -> Result<()> {
        self.store.rename_group(chat_id, title).await?;
        info!(chat_id = chat_id, title = %title, "Group name updated");
        Ok(())
    }

    /// Mark a group as deactivated by its chat ID
    ///
    /// Terminal-state transition invoked when the bot cannot manage the
    /// group. Fail-soft on unknown chats.
    pub async fn deactivate_group(&self, chat_id: i64) -> Result<()> {
        self.store.deactivate_group(chat_id).await
    }
}
