//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the TokenGate application.

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
///
/// The returned guard owns the file writer thread; hold it for the
/// lifetime of the process or file output stops.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "tokengate.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log admin sync outcomes
pub fn log_sync_result(chat_id: i64, admin_count: usize, bot_is_admin: bool) {
    if bot_is_admin {
        info!(
            chat_id = chat_id,
            admin_count = admin_count,
            "Admin sync completed"
        );
    } else {
        warn!(
            chat_id = chat_id,
            admin_count = admin_count,
            "Admin sync found bot without management rights"
        );
    }
}
