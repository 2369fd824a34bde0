//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{TokenGateError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_invite_config(&settings.invites)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(TokenGateError::Config(
            "Bot token is required".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(TokenGateError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(TokenGateError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(TokenGateError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate invite link configuration
fn validate_invite_config(config: &super::InviteConfig) -> Result<()> {
    if config.ttl_hours <= 0 {
        return Err(TokenGateError::Config(
            "Invite link TTL must be greater than 0 hours".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(TokenGateError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(TokenGateError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_need_token() {
        let settings = Settings::default();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_valid_settings_pass() {
        let mut settings = Settings::default();
        settings.bot.token = "123456:TEST".to_string();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_zero_invite_ttl_rejected() {
        let mut settings = Settings::default();
        settings.bot.token = "123456:TEST".to_string();
        settings.invites.ttl_hours = 0;
        assert!(validate_settings(&settings).is_err());
    }
}
