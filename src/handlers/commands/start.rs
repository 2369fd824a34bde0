//! /start command handler

use teloxide::{Bot, types::Message, prelude::*};
use tracing::debug;
use crate::utils::errors::Result;

pub async fn handle_start(bot: Bot, msg: Message) -> Result<()> {
    debug!(chat_id = msg.chat.id.0, "Handling /start command");

    bot.send_message(
        msg.chat.id,
        "Welcome to TokenGate! I manage token-gated access to Telegram groups.\n\n\
         Add me to a group as an admin and link your wallet through the web \
         console to receive an invite link.",
    )
    .await?;

    Ok(())
}
