//! Services module
//!
//! This module contains business logic services

pub mod telegram;
pub mod gate;
pub mod membership;
pub mod sync;

// Re-export commonly used services
pub use telegram::{ChatApi, TelegramApi, ChatAdmin, AdminStatus};
pub use gate::{GateRuleService, GateRuleStore, validate_rule};
pub use membership::{MembershipService, MembershipStore, GroupInvite};
pub use sync::{AdminSyncService, SyncStore, SyncOutcome};

use chrono::Duration;
use teloxide::Bot;
use crate::config::settings::Settings;
use crate::database::DatabaseService;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub gate_service: GateRuleService<DatabaseService>,
    pub membership_service: MembershipService<TelegramApi, DatabaseService>,
    pub sync_service: AdminSyncService<TelegramApi, DatabaseService>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    ///
    /// `bot_user_id` is the bot's own Telegram user id, used by the admin
    /// sync to locate itself in fetched rosters.
    pub fn new(bot: Bot, bot_user_id: i64, settings: &Settings, database: DatabaseService) -> Self {
        let api = TelegramApi::new(bot);
        let invite_ttl = Duration::hours(settings.invites.ttl_hours);

        let gate_service = GateRuleService::new(database.clone());
        let membership_service = MembershipService::new(api.clone(), database.clone(), invite_ttl);
        let sync_service = AdminSyncService::new(api, database, bot_user_id);

        Self {
            gate_service,
            membership_service,
            sync_service,
        }
    }
}
