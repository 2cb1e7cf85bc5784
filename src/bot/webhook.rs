//! Webhook mode implementation for the bot.
//!
//! Uses teloxide's axum webhook support to:
//! - Call `setWebhook` on Telegram
//! - Build an axum router that receives updates
//! - Call `deleteWebhook` on shutdown
//!
//! The router is extended with a `/healthz` route and served by us.

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::{error, info};
use url::Url;

use super::dispatcher::ThrottledBot;
use crate::config::Config;

/// Start the bot in webhook mode and dispatch until shutdown.
pub async fn start_webhook(
    config: &Config,
    dispatcher: &mut Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
    bot: ThrottledBot,
) -> anyhow::Result<()> {
    let webhook_url = config
        .webhook_url
        .as_ref()
        .context("WEBHOOK_URL must be set when using webhook mode")?;
    let url = Url::parse(webhook_url).context("Invalid WEBHOOK_URL format")?;

    // Listen on all interfaces at the configured port
    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));

    let mut options = Options::new(address, url.clone());
    if let Some(ref secret) = config.webhook_secret {
        options = options.secret_token(secret.clone());
        info!("Webhook secret token configured");
    }

    info!("🔗 Setting webhook URL: {}", url);

    // setWebhook only needs basic API access, so the unthrottled bot is used.
    let (listener, stop_flag, router) = webhooks::axum_to_router(bot.inner().clone(), options)
        .await
        .context("Failed to register webhook")?;

    let app = router.merge(health_router());
    let tcp = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("📡 Listening on: {}", address);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app)
            .with_graceful_shutdown(stop_flag)
            .await
        {
            error!("Webhook server error: {}", e);
        }
    });

    let error_handler = LoggingErrorHandler::with_custom_text("Error from update listener");
    dispatcher
        .dispatch_with_listener(listener, error_handler)
        .await;

    Ok(())
}

fn health_router() -> Router {
    Router::new().route("/healthz", get(|| async { "ok" }))
}
