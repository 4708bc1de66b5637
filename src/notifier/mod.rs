//! Rate-limited spike alerts.
//!
//! [`AlertNotifier`] is a two-state gate. While *Idle* a spike event is
//! rendered and handed to the [`Messenger`]; the attempt itself (not its
//! success) starts a cooldown window, and while *Cooling* every further event
//! is dropped without building a message or touching the network. A failing
//! destination therefore sees at most one attempt per window.
//!
//! The cooldown check and the timestamp update happen under one lock, which
//! is released before the delivery is awaited, so a slow destination never
//! blocks other callers and two concurrent callers cannot both pass the gate.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Local};
use serde::Serialize;
use tracing::{error, info};

use crate::clock::Clock;
use crate::models::SpikeEvent;

pub mod format;
pub mod telegram;

pub use telegram::{DisabledMessenger, Messenger, TelegramMessenger};

// ---

/// Default minimum spacing between two alert attempts.
pub const DEFAULT_COOLDOWN_SECS: i64 = 300;

/// What happened to one `send` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// Cooldown active; nothing was attempted.
    Suppressed,
    /// The destination accepted the message.
    Delivered,
    /// Delivery was attempted and failed.
    Failed,
}

impl SendOutcome {
    pub fn is_success(self) -> bool {
        self == SendOutcome::Delivered
    }
}

pub struct AlertNotifier {
    // ---
    messenger: Arc<dyn Messenger>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    last_attempt: Mutex<Option<DateTime<Local>>>,
}

impl AlertNotifier {
    // ---
    pub fn new(messenger: Arc<dyn Messenger>, clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            messenger,
            clock,
            cooldown,
            last_attempt: Mutex::new(None),
        }
    }

    pub fn last_attempt(&self) -> Option<DateTime<Local>> {
        *self.last_attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while a previous attempt is still inside the cooldown window.
    pub fn is_cooling(&self) -> bool {
        let now = self.clock.now();
        self.last_attempt()
            .is_some_and(|last| now - last < self.cooldown)
    }

    /// Send a spike alert unless the cooldown is active.
    pub async fn send(&self, event: &SpikeEvent) -> SendOutcome {
        // ---
        let now = self.clock.now();
        {
            let mut last_attempt = self
                .last_attempt
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if let Some(last) = *last_attempt {
                let elapsed = now - last;
                if elapsed < self.cooldown {
                    let remaining = (self.cooldown - elapsed).num_milliseconds() as f64 / 1000.0;
                    info!(
                        "Alert cooldown active. Skipping alert. ({:.1}s remaining)",
                        remaining
                    );
                    return SendOutcome::Suppressed;
                }
            }

            // Attempts, not successes, start the window.
            *last_attempt = Some(now);
        }

        let message = format::render_alert(event, now);
        match self.messenger.send_message(&message).await {
            Ok(()) => {
                info!(
                    "Successfully sent {} voltage spike alert ({:.1}V, {}) to chat {}",
                    event.severity,
                    event.voltage,
                    event.area,
                    self.messenger.destination()
                );
                SendOutcome::Delivered
            }
            Err(e) => {
                error!("Failed to send voltage spike alert: {}", e);
                SendOutcome::Failed
            }
        }
    }

    /// Send a status heartbeat. Not rate limited.
    pub async fn send_status(&self, status: &str, voltage: Option<f64>, uptime: Option<&str>) -> bool {
        // ---
        let message = format::render_status(status, voltage, uptime, self.clock.now());
        match self.messenger.send_message(&message).await {
            Ok(()) => {
                info!("Successfully sent system status update ({})", status);
                true
            }
            Err(e) => {
                error!("Failed to send system status: {}", e);
                false
            }
        }
    }

    /// Probe the destination without sending anything.
    pub async fn test_connection(&self) -> bool {
        // ---
        match self.messenger.identity().await {
            Ok(identity) => {
                info!("Bot connection successful: {}", identity);
                true
            }
            Err(e) => {
                error!("Bot connection failed: {}", e);
                false
            }
        }
    }
}
