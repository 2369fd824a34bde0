//! TokenGate Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use tracing::{info, warn, error};

use tokengate::{
    config::Settings,
    utils::logging,
    database::DatabaseService,
    services::ServiceFactory,
    handlers::{
        commands::{Command, handle_command},
        messages::{handle_new_chat_title, handle_my_chat_member, handle_chat_member},
    },
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard keeps the file writer alive until exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting TokenGate Telegram Bot...");

    // Initialize database connection and run migrations
    info!("Connecting to database...");
    let database_service = DatabaseService::connect(&settings.database).await?;
    database_service.run_migrations().await?;

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);
    let me = bot.get_me().await?;
    let bot_user_id = me.id.0 as i64;
    info!(bot_user_id = bot_user_id, username = ?me.username, "Bot identity resolved");

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), bot_user_id, &settings, database_service);
    let services_arc = Arc::new(services);

    info!("Setting up bot handlers...");
    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![services_arc])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("TokenGate bot is ready!");

    if let Some(webhook_url) = &settings.bot.webhook_url {
        info!("Webhook URL configured: {}", webhook_url);
        info!("Note: Webhook setup not implemented in this version, falling back to polling");
    }

    info!("Starting bot with polling mode...");
    dispatcher.dispatch().await;

    info!("TokenGate bot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    // Handle commands
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_commands),
                )
                .branch(
                    // Handle group title changes
                    dptree::filter(|msg: Message| msg.new_chat_title().is_some())
                        .endpoint(handle_title_changes),
                ),
        )
        .branch(
            // Handle the bot's own membership updates (added/removed/demoted)
            Update::filter_my_chat_member().endpoint(handle_own_membership),
        )
        .branch(
            // Handle member joins that consume tracked invite links
            Update::filter_chat_member().endpoint(handle_member_updates),
        )
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: Arc<ServiceFactory>,
) -> HandlerResult {
    if let Err(e) = handle_command(bot, msg, cmd, services).await {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle group title change messages
async fn handle_title_changes(msg: Message, services: Arc<ServiceFactory>) -> HandlerResult {
    if let Err(e) = handle_new_chat_title(msg, services).await {
        error!(error = %e, "Error handling chat title change");
        return Err(e.into());
    }

    Ok(())
}

/// Handle the bot's own membership updates
async fn handle_own_membership(
    bot: Bot,
    update: teloxide::types::ChatMemberUpdated,
    services: Arc<ServiceFactory>,
) -> HandlerResult {
    if let Err(e) = handle_my_chat_member(bot, update, services).await {
        error!(error = %e, "Error handling bot membership update");
        return Err(e.into());
    }

    Ok(())
}

/// Handle other members' updates
async fn handle_member_updates(
    update: teloxide::types::ChatMemberUpdated,
    services: Arc<ServiceFactory>,
) -> HandlerResult {
    if let Err(e) = handle_chat_member(update, services).await {
        error!(error = %e, "Error handling chat member update");
        return Err(e.into());
    }

    Ok(())
}
