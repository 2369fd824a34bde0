//! TokenGate Telegram Bot
//!
//! A Telegram bot for token-gated community management. This library
//! provides the access-control core: admin roster reconciliation,
//! single-use invite link issuance for wallet-linked accounts, and
//! token-gate rule management per group.

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{TokenGateError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
