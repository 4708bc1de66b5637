//! Configuration loader for the `voltwatch` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Messaging credentials are optional: without them
//! the service still runs and alerts are only logged.
//!
use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::{anyhow, Result};

use crate::notifier::{telegram::DEFAULT_API_URL, DEFAULT_COOLDOWN_SECS};

/// Parse an optional numeric environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";
const CHAT_ID_PLACEHOLDER: &str = "YOUR_CHAT_ID_HERE";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Recorded current log replayed by the feed.
    pub csv_path: PathBuf,

    /// Directory holding the front-end.
    pub static_dir: PathBuf,

    /// Default number of readings returned for chart bootstrapping.
    pub recent_limit: usize,

    /// Minimum spacing between two alert attempts, in seconds.
    pub alert_cooldown_secs: i64,

    /// Bot token, if configured.
    pub telegram_bot_token: Option<String>,

    /// Destination chat id, if configured.
    pub telegram_chat_id: Option<String>,

    /// Bot API base URL.
    pub telegram_api_url: String,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `VOLTWATCH_BIND_ADDR` – listen address (default: 0.0.0.0:5000)
/// - `FEED_CSV_PATH` – recorded current log (default: dc_current_log.csv)
/// - `STATIC_DIR` – front-end directory (default: .)
/// - `RECENT_LIMIT` – readings for chart bootstrapping (default: 100)
/// - `ALERT_COOLDOWN_SECS` – alert cooldown window (default: 300)
/// - `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID` – bot credentials (default: unset)
/// - `TELEGRAM_API_URL` – Bot API base URL (default: https://api.telegram.org)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let bind_addr = parse_env!(
        "VOLTWATCH_BIND_ADDR",
        SocketAddr,
        SocketAddr::from(([0, 0, 0, 0], 5000))
    );
    let csv_path = PathBuf::from(env_or!("FEED_CSV_PATH", "dc_current_log.csv"));
    let static_dir = PathBuf::from(env_or!("STATIC_DIR", "."));
    let recent_limit = parse_env!("RECENT_LIMIT", usize, 100);
    let alert_cooldown_secs = parse_env!("ALERT_COOLDOWN_SECS", i64, DEFAULT_COOLDOWN_SECS);
    if alert_cooldown_secs < 0 {
        return Err(anyhow!("Invalid ALERT_COOLDOWN_SECS: must not be negative"));
    }

    let telegram_bot_token = credential("TELEGRAM_BOT_TOKEN", TOKEN_PLACEHOLDER);
    let telegram_chat_id = credential("TELEGRAM_CHAT_ID", CHAT_ID_PLACEHOLDER);
    let telegram_api_url = env_or!("TELEGRAM_API_URL", DEFAULT_API_URL);

    Ok(Config {
        bind_addr,
        csv_path,
        static_dir,
        recent_limit,
        alert_cooldown_secs,
        telegram_bot_token,
        telegram_chat_id,
        telegram_api_url,
    })
}

/// Blank and placeholder values count as unset.
fn credential(var_name: &str, placeholder: &str) -> Option<String> {
    env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != placeholder)
}

impl Config {
    // ---
    /// Token and chat id, when both are configured.
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some((token.as_str(), chat_id.as_str())),
            _ => None,
        }
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the bot token while showing all other values that were loaded.
    pub fn log_config(&self) {
        // ---
        let masked_token = self
            .telegram_bot_token
            .as_deref()
            .map(mask_token)
            .unwrap_or_else(|| "<unset>".to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  VOLTWATCH_BIND_ADDR : {}", self.bind_addr);
        tracing::info!("  FEED_CSV_PATH       : {}", self.csv_path.display());
        tracing::info!("  STATIC_DIR          : {}", self.static_dir.display());
        tracing::info!("  RECENT_LIMIT        : {}", self.recent_limit);
        tracing::info!("  ALERT_COOLDOWN_SECS : {}", self.alert_cooldown_secs);
        tracing::info!("  TELEGRAM_BOT_TOKEN  : {}", masked_token);
        tracing::info!(
            "  TELEGRAM_CHAT_ID    : {}",
            self.telegram_chat_id.as_deref().unwrap_or("<unset>")
        );
        tracing::info!("  TELEGRAM_API_URL    : {}", self.telegram_api_url);
    }
}

/// Keep the bot id (before the colon) and hide the secret part.
fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((bot_id, _)) => format!("{bot_id}:****"),
        None => "****".to_string(),
    }
}
