//! Message and membership event handlers
//!
//! Handles chat title changes, the bot's own membership transitions, and
//! join events that consume tracked invite links.

use std::sync::Arc;
use teloxide::{Bot, types::{ChatMemberKind, ChatMemberUpdated, Message}, prelude::*};
use tracing::{info, debug, warn};
use crate::services::{ServiceFactory, SyncOutcome};
use crate::utils::errors::Result;

/// Handle a group title change by updating the stored group name
pub async fn handle_new_chat_title(msg: Message, services: Arc<ServiceFactory>) -> Result<()> {
    let Some(title) = msg.new_chat_title() else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    debug!(chat_id = chat_id, title = %title, "Chat title changed");
    services.sync_service.rename_group(chat_id, title).await?;

    Ok(())
}

/// Handle the bot's own membership changes in a chat
///
/// Being added or promoted triggers an admin sync (creating the group row
/// on first contact); being removed, banned, or demoted to a plain member
/// deactivates the group.
pub async fn handle_my_chat_member(
    bot: Bot,
    update: ChatMemberUpdated,
    services: Arc<ServiceFactory>,
) -> Result<()> {
    let chat_id = update.chat.id.0;
    let title = update.chat.title().unwrap_or_default();

    match &update.new_chat_member.kind {
        ChatMemberKind::Left | ChatMemberKind::Banned(_) => {
            info!(chat_id = chat_id, "Bot removed from chat, deactivating group");
            services.sync_service.deactivate_group(chat_id).await?;
        }
        _ => {
            debug!(chat_id = chat_id, "Bot membership changed, running admin sync");
            match services.sync_service.sync_admins(chat_id, title).await? {
                SyncOutcome::Synced { admin_count } => {
                    info!(chat_id = chat_id, admin_count = admin_count, "Group activated");
                }
                SyncOutcome::BotNotAdmin => {
                    if let Err(e) = bot
                        .send_message(update.chat.id, "I need to be an admin to manage this group.")
                        .await
                    {
                        warn!(chat_id = chat_id, error = %e, "Failed to send admin notice");
                    }
                }
            }
        }
    }

    Ok(())
}

/// Handle other users' membership changes in a chat
///
/// A user joining through one of our tracked invite links consumes that
/// link and activates the member row.
pub async fn handle_chat_member(
    update: ChatMemberUpdated,
    services: Arc<ServiceFactory>,
) -> Result<()> {
    let was_out = update.old_chat_member.kind.is_left() || update.old_chat_member.kind.is_banned();
    let is_in = update.new_chat_member.kind.is_member() || update.new_chat_member.kind.is_restricted();
    let joined = was_out && is_in;

    if !joined {
        return Ok(());
    }

    let Some(invite_link) = update.invite_link.as_ref() else {
        return Ok(());
    };

    let user_id = update.new_chat_member.user.id.0 as i64;
    let consumed = services
        .membership_service
        .record_join(&invite_link.invite_link)
        .await?;

    if consumed {
        info!(
            chat_id = update.chat.id.0,
            user_id = user_id,
            "Member joined via tracked invite link"
        );
    }

    Ok(())
}
