//! Voltage spike monitor backend.
//!
//! Replays a recorded current log as a live-looking voltage feed and forwards
//! spike events to a bot-style messaging destination, at most one attempt per
//! cooldown window. `main.rs` wires the pieces together; the `routes` gateway
//! exposes them over HTTP.

use std::sync::Arc;

use chrono::Duration;
use tracing::warn;

pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod notifier;
pub mod routes;
pub mod webhook;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use feed::FeedReader;
pub use notifier::{AlertNotifier, SendOutcome};

// Re-exported so routes/*.rs only depend on their parent module, not on models.rs.
pub use models::{Reading, Severity, SpikeEvent};

use notifier::{DisabledMessenger, Messenger, TelegramMessenger};

// ---

/// Everything the HTTP handlers share. Feed and notifier are independent and
/// never share a lock.
pub struct AppState {
    // ---
    pub feed: FeedReader,
    pub notifier: AlertNotifier,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}

impl AppState {
    // ---
    pub fn new(
        feed: FeedReader,
        notifier: AlertNotifier,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        Self {
            feed,
            notifier,
            clock,
            config,
        }
    }

    /// Load the feed and build the notifier described by `config`.
    pub fn from_config(config: Config, clock: Arc<dyn Clock>) -> Self {
        // ---
        let feed = FeedReader::load(&config.csv_path, clock.clone());

        let messenger: Arc<dyn Messenger> = match config.telegram_credentials() {
            Some((token, chat_id)) => Arc::new(TelegramMessenger::new(
                config.telegram_api_url.clone(),
                token,
                chat_id,
            )),
            None => {
                warn!("Telegram not configured, alerts will be logged only");
                Arc::new(DisabledMessenger)
            }
        };
        let notifier = AlertNotifier::new(
            messenger,
            clock.clone(),
            Duration::seconds(config.alert_cooldown_secs),
        );

        Self::new(feed, notifier, clock, config)
    }
}
