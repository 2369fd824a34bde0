//! /help command handler

use teloxide::{Bot, types::Message, prelude::*, utils::command::BotCommands};
use crate::handlers::commands::Command;
use crate::utils::errors::Result;

pub async fn handle_help(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;

    Ok(())
}
