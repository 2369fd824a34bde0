//! /sync command handler
//!
//! Triggers an admin roster reconciliation for the group the command was
//! issued in and reports whether the bot can still manage it.

use std::sync::Arc;
use teloxide::{Bot, types::Message, prelude::*};
use tracing::{info, debug};
use crate::services::{ServiceFactory, SyncOutcome};
use crate::utils::errors::Result;

pub async fn handle_sync(bot: Bot, msg: Message, services: Arc<ServiceFactory>) -> Result<()> {
    let chat = &msg.chat;

    if !chat.is_group() && !chat.is_supergroup() {
        bot.send_message(chat.id, "This command only works in a group chat.")
            .await?;
        return Ok(());
    }

    let chat_id = chat.id.0;
    let title = chat.title().unwrap_or_default();
    debug!(chat_id = chat_id, "Handling /sync command");

    match services.sync_service.sync_admins(chat_id, title).await? {
        SyncOutcome::Synced { admin_count } => {
            info!(chat_id = chat_id, admin_count = admin_count, "Group synced");
            bot.send_message(chat.id, "Synced :)").await?;
        }
        SyncOutcome::BotNotAdmin => {
            bot.send_message(chat.id, "I need to be an admin to manage this group.")
                .await?;
        }
    }

    Ok(())
}
