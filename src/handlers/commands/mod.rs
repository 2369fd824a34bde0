//! Command handlers module
//!
//! This module contains handlers for all bot commands like /start, /help, /sync

pub mod start;
pub mod help;
pub mod sync;

use std::sync::Arc;
use teloxide::{Bot, types::Message, utils::command::BotCommands};
use crate::utils::errors::Result;
use crate::services::ServiceFactory;

/// All available bot commands
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "TokenGate commands:")]
pub enum Command {
    #[command(description = "Start the bot and show welcome message")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Sync group admins and verify bot permissions")]
    Sync,
}

/// Main command dispatcher
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: Arc<ServiceFactory>,
) -> Result<()> {
    match cmd {
        Command::Start => start::handle_start(bot, msg).await,
        Command::Help => help::handle_help(bot, msg).await,
        Command::Sync => sync::handle_sync(bot, msg, services).await,
    }
}
