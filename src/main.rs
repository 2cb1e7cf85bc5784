//! Lao Translator Bot
//!
//! Telegram bot translating Chinese to Lao with per-user daily quotas.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Record stores (Google Sheets, MongoDB, in-memory)
//! - `cache` - Moka-backed typed caches
//! - `ai` - Gemini client with key/model failover
//! - `quota` - Quota day clock and in-memory usage tracking
//! - `translation` - Quota-checked translation flow
//! - `session` - Per-user toggles and pending inputs
//! - `permissions` - Admin allow-list
//! - `bot` - Core bot functionality (with Throttle for API rate limiting)
//! - `plugins` - Command and menu handlers (extensible)
//! - `jobs` - Daily reset and vocabulary digest
//! - `utils` - Utility functions

mod ai;
mod bot;
mod cache;
mod config;
mod database;
mod jobs;
mod permissions;
mod plugins;
mod quota;
mod session;
mod texts;
mod translation;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai::GeminiClient;
use bot::AppState;
use config::{Config, StoreBackend};
use database::{Database, MemoryStore, MongoStore, SharedStore};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lao_translator_bot=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Lao translator bot...");

    // A missing bot token is the only fatal configuration error
    let config = Config::from_env()?;
    info!("Bot mode: {:?}", config.bot_mode);

    let store = open_store(&config).await;
    info!("Record store: {}", store.name());

    let generator = Arc::new(GeminiClient::new(&config.ai));
    if config.ai.api_keys.is_empty() {
        warn!("No Gemini API keys configured, translation is unavailable");
    } else {
        info!(
            "Gemini configured with {} keys and {} models",
            config.ai.api_keys.len(),
            config.ai.models.len()
        );
    }

    if config.admin_ids.is_empty() {
        info!("No admin IDs configured (ADMIN_IDS is empty)");
    } else {
        info!("Bot admins: {:?}", config.admin_ids);
    }

    let state = AppState::new(store, generator, &config);

    // Initialize bot with Throttle for automatic rate limiting
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    let jobs = jobs::spawn_jobs(bot.clone(), state.clone(), &config.quota);

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(&config, bot, dispatcher).await;

    jobs.shutdown();
    info!("Bot stopped");

    Ok(())
}

/// Open the configured record store, falling back to memory on failure.
async fn open_store(config: &Config) -> SharedStore {
    match config.store_backend {
        StoreBackend::Sheets => {
            if let Some(sheets) = &config.sheets {
                match database::sheets::open(sheets) {
                    Ok(store) => return Arc::new(store),
                    Err(e) => warn!("Failed to open Google Sheets store: {}", e),
                }
            }
        }
        StoreBackend::Mongo => {
            if let Some(uri) = &config.mongodb_uri {
                info!("Connecting to MongoDB...");
                match connect_mongo(uri, &config.mongodb_database).await {
                    Ok(store) => return Arc::new(store),
                    Err(e) => warn!("Failed to connect to MongoDB: {:#}", e),
                }
            }
        }
        StoreBackend::Memory => return Arc::new(MemoryStore::new()),
    }

    warn!("Falling back to in-memory store, data will be lost on restart");
    Arc::new(MemoryStore::new())
}

async fn connect_mongo(uri: &str, database: &str) -> anyhow::Result<MongoStore> {
    let db = Database::connect(uri, database).await?;
    MongoStore::new(&db).await
}
