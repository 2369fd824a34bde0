//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub invites: InviteConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub webhook_url: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Invite link issuance configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InviteConfig {
    /// Hours until an issued invite link expires
    pub ttl_hours: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("TOKENGATE"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::TokenGateError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                webhook_url: None,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/tokengate".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            invites: InviteConfig {
                // Telegram invite links are issued for 2 days
                ttl_hours: 48,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/tokengate.log".to_string(),
            },
        }
    }
}
