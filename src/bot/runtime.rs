//! Bot runtime - Polling and Webhook runners.

use teloxide::prelude::*;
use tracing::{error, info};

use super::dispatcher::ThrottledBot;
use super::webhook;
use crate::config::{BotMode, Config};

/// Run the bot with the configured mode.
///
/// Automatically selects between polling and webhook based on config.
/// A webhook that cannot be registered falls back to polling.
pub async fn run(
    config: &Config,
    bot: ThrottledBot,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
) {
    match config.bot_mode {
        BotMode::Polling => {
            info!("Starting bot in polling mode...");
            dispatcher.dispatch().await;
        }
        BotMode::Webhook => {
            info!("Starting bot in webhook mode...");
            if let Err(e) = webhook::start_webhook(config, &mut dispatcher, bot).await {
                error!("Webhook setup failed: {:#}, falling back to polling", e);
                dispatcher.dispatch().await;
            }
        }
    }
}
