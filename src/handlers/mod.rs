//! Bot handlers module
//!
//! This module contains all Telegram bot handlers organized by type:
//! - Command handlers for bot commands
//! - Message handlers for chat events and membership updates

pub mod commands;
pub mod messages;

// Re-export commonly used handler functions
pub use commands::{Command, handle_command};
pub use messages::{handle_new_chat_title, handle_my_chat_member, handle_chat_member};
