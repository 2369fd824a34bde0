//! Error handling for TokenGate
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for TokenGate application
#[derive(Error, Debug)]
pub enum TokenGateError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Group not found: {chat_id}")]
    GroupNotFound { chat_id: i64 },

    #[error("Account not found: {telegram_id}")]
    AccountNotFound { telegram_id: i64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for TokenGate operations
pub type Result<T> = std::result::Result<T, TokenGateError>;

impl TokenGateError {
    /// Build a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        TokenGateError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            TokenGateError::Database(_) => false,
            TokenGateError::Migration(_) => false,
            TokenGateError::Telegram(_) => true,
            TokenGateError::Config(_) => false,
            TokenGateError::Validation { .. } => false,
            TokenGateError::PermissionDenied(_) => false,
            TokenGateError::GroupNotFound { .. } => false,
            TokenGateError::AccountNotFound { .. } => false,
            TokenGateError::Serialization(_) => false,
            TokenGateError::Io(_) => true,
            TokenGateError::InvalidInput(_) => false,
        }
    }
}
