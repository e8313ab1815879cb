// ABOUTME: Library root for threadbot-telegram.
// ABOUTME: Exports bridge, config, error and telegram modules and the Long Polling run loop.

pub mod bridge;
pub mod config;
pub mod error;
pub mod telegram;

pub use bridge::Bridge;
pub use config::Config;
pub use error::{BotError, Result};
pub use telegram::TelegramTransport;

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::requests::ResponseResult;
use teloxide::types::{Message, Update};
use tracing::{info, warn};

/// Forward one Telegram message to the bridge.
async fn handle_update(msg: Message, bridge: Arc<Bridge>) -> ResponseResult<()> {
    bridge.handle_message(&msg);
    Ok(())
}

/// Run the Telegram bot with the given config path.
pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    info!("threadbot-telegram starting");

    // Load configuration
    let config = Config::load(config_path)?;
    info!(
        allowed_chats = config.bot.allowed_chats.len(),
        command_timeout_secs = config.bot.command_timeout_secs,
        heartbeat_interval_secs = config.bot.heartbeat_interval_secs,
        "Configuration loaded"
    );

    // Create the bridge
    let bridge = Arc::new(Bridge::new(config).await?);
    info!("Bridge initialized");

    let bot = bridge.telegram().inner().clone();
    let handler = Update::filter_message().endpoint(handle_update);
    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![bridge])
        .build();

    // Handle shutdown signals
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    info!("Starting Long Polling");

    // Run until shutdown signal
    tokio::select! {
        _ = dispatcher.dispatch() => {
            info!("Long Polling stopped");
        }
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }

    info!("threadbot-telegram stopped");
    Ok(())
}
