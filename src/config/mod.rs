//! Configuration module for the translator bot.
//!
//! Loads configuration from environment variables. Only the bot token is
//! mandatory; every other setting degrades to a default with a warning.

use std::env;
use std::str::FromStr;

use anyhow::bail;
use chrono::NaiveTime;
use serde::Deserialize;
use tracing::warn;

/// Bot running mode
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Which backend holds user rows and translation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Sheets,
    Mongo,
    Memory,
}

/// Google Sheets settings.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    /// Users table range, e.g. `Users!A:F`.
    pub users_range: String,
    /// History table range, e.g. `History!A:D`.
    pub history_range: String,
    /// Raw service-account key JSON.
    pub credentials_json: String,
}

/// Generative-AI settings.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_url: String,
    /// Credentials in failover order.
    pub api_keys: Vec<String>,
    /// Models in failover order.
    pub models: Vec<String>,
}

/// Quota and scheduling settings.
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub daily_quota: u32,
    pub trial_days: u32,
    pub max_chars: usize,
    pub utc_offset_hours: i32,
    pub reset_time: NaiveTime,
    pub vocab_interval_minutes: u64,
    pub vocab_words: usize,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_quota: 3,
            trial_days: 3,
            max_chars: 20,
            utc_offset_hours: 7,
            reset_time: NaiveTime::MIN,
            vocab_interval_minutes: 720,
            vocab_words: 5,
        }
    }
}

impl QuotaConfig {
    /// The vocabulary digest runs only with a non-zero interval and word count.
    pub fn vocab_enabled(&self) -> bool {
        self.vocab_interval_minutes > 0 && self.vocab_words > 0
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Admin user IDs (comma-separated `ADMIN_IDS`).
    pub admin_ids: Vec<u64>,

    /// Group that receives vocabulary digests.
    pub group_chat_id: Option<i64>,

    // Storage
    pub store_backend: StoreBackend,
    pub sheets: Option<SheetsConfig>,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    pub ai: AiConfig,
    pub quota: QuotaConfig,
}

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODELS: &str = "gemini-2.0-flash,gemini-1.5-flash";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns an error only when the bot token is missing.
    pub fn from_env() -> anyhow::Result<Self> {
        let lookup = |key: &str| env::var(key).ok();
        Self::from_lookup(lookup)
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(bot_token) = var("BOT_TOKEN").or_else(|| var("TELEGRAM_BOT_TOKEN")) else {
            bail!("BOT_TOKEN must be set");
        };

        let webhook_url = var("WEBHOOK_URL");
        let mut bot_mode = match var("BOT_MODE").map(|m| m.to_lowercase()).as_deref() {
            Some("webhook") => BotMode::Webhook,
            _ => BotMode::Polling,
        };
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            warn!("BOT_MODE is webhook but WEBHOOK_URL is not set, falling back to polling");
            bot_mode = BotMode::Polling;
        }

        let admin_ids = var("ADMIN_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let sheets = load_sheets(&var);
        let mongodb_uri = var("MONGODB_URI");

        let store_backend = match var("STORE_BACKEND").map(|b| b.to_lowercase()).as_deref() {
            Some("sheets") if sheets.is_some() => StoreBackend::Sheets,
            Some("mongo") if mongodb_uri.is_some() => StoreBackend::Mongo,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                warn!("STORE_BACKEND={} is not usable with current settings", other);
                fallback_backend(sheets.is_some(), mongodb_uri.is_some())
            }
            None => fallback_backend(sheets.is_some(), mongodb_uri.is_some()),
        };

        let mut api_keys: Vec<String> = ["GEMINI_API_KEY_1", "GEMINI_API_KEY_2", "GEMINI_API_KEY_3"]
            .iter()
            .filter_map(|key| var(key))
            .collect();
        if api_keys.is_empty()
            && let Some(single) = var("GEMINI_API_KEY")
        {
            api_keys.push(single);
        }
        if api_keys.is_empty() {
            warn!("No GEMINI_API_KEY configured, translation is disabled");
        }

        let models = split_list(&var("GEMINI_MODELS").unwrap_or_else(|| DEFAULT_MODELS.into()));
        let models = if models.is_empty() {
            split_list(DEFAULT_MODELS)
        } else {
            models
        };

        let defaults = QuotaConfig::default();
        let reset_time = match var("QUOTA_RESET_TIME") {
            Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M").unwrap_or_else(|_| {
                warn!("Invalid QUOTA_RESET_TIME '{}', using 00:00", raw);
                defaults.reset_time
            }),
            None => defaults.reset_time,
        };

        let quota = QuotaConfig {
            daily_quota: parse_or(&var, "DEFAULT_DAILY_QUOTA", defaults.daily_quota),
            trial_days: parse_or(&var, "DEFAULT_TRIAL_DAYS", defaults.trial_days),
            max_chars: parse_or(&var, "MAX_TRANSLATION_CHARS", defaults.max_chars),
            utc_offset_hours: parse_or(&var, "QUOTA_UTC_OFFSET_HOURS", defaults.utc_offset_hours)
                .clamp(-23, 23),
            reset_time,
            // Zero in either disables the vocabulary digest.
            vocab_interval_minutes: parse_or(
                &var,
                "VOCAB_INTERVAL_MINUTES",
                defaults.vocab_interval_minutes,
            ),
            vocab_words: parse_or(&var, "VOCAB_WORDS", defaults.vocab_words),
        };

        Ok(Self {
            bot_token,
            bot_mode,
            webhook_url,
            webhook_port: parse_or(&var, "WEBHOOK_PORT", 8080),
            webhook_secret: var("WEBHOOK_SECRET"),
            admin_ids,
            group_chat_id: parse_opt(&var, "GROUP_CHAT_ID"),
            store_backend,
            sheets,
            mongodb_uri,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "lao_translator".into()),
            ai: AiConfig {
                api_url: var("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.into()),
                api_keys,
                models,
            },
            quota,
        })
    }
}

fn fallback_backend(has_sheets: bool, has_mongo: bool) -> StoreBackend {
    if has_sheets {
        StoreBackend::Sheets
    } else if has_mongo {
        StoreBackend::Mongo
    } else {
        warn!("No persistent store configured, user data will live in memory only");
        StoreBackend::Memory
    }
}

fn load_sheets<F>(var: &F) -> Option<SheetsConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let spreadsheet_id = var("SPREADSHEET_ID")?;

    let credentials_json = if let Some(encoded) = var("GOOGLE_CREDENTIALS_BASE64") {
        use base64::Engine;
        match base64::engine::general_purpose::STANDARD.decode(encoded.as_bytes()) {
            Ok(bytes) => String::from_utf8(bytes).ok(),
            Err(e) => {
                warn!("GOOGLE_CREDENTIALS_BASE64 is not valid base64: {}", e);
                None
            }
        }
    } else {
        var("GOOGLE_CREDENTIALS_JSON")
    };

    let Some(credentials_json) = credentials_json else {
        warn!("SPREADSHEET_ID is set but no Google credentials were found");
        return None;
    };

    Some(SheetsConfig {
        spreadsheet_id,
        users_range: var("SHEET_RANGE").unwrap_or_else(|| "Users!A:F".into()),
        history_range: var("HISTORY_RANGE").unwrap_or_else(|| "History!A:D".into()),
        credentials_json,
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value for {}: '{}', using default", key, raw);
            default
        }),
        None => default,
    }
}

fn parse_opt<F, T>(var: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Invalid value for {}: '{}', ignoring it", key, raw);
            None
        }
    }
}
