//! Webhook-style entry point for raw voltage readings.
//!
//! Unlike the alert endpoint, which trusts the caller's severity, this path
//! derives severity from the voltage itself and only bothers the notifier
//! once a reading is above [`ALERT_THRESHOLD`].

use chrono::SecondsFormat;
use serde_json::Value;
use tracing::debug;

use crate::clock::Clock;
use crate::models::{number_like, Severity, SpikeEvent, DEFAULT_AREA};
use crate::notifier::{AlertNotifier, SendOutcome};

// ---

/// Readings at or below this voltage never raise an alert.
pub const ALERT_THRESHOLD: f64 = 234.0;

/// Classify a voltage; lower bounds are inclusive.
pub fn severity_for(voltage: f64) -> Severity {
    if voltage >= 300.0 {
        Severity::Critical
    } else if voltage >= 280.0 {
        Severity::High
    } else if voltage >= 260.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// A raw reading pushed at the webhook, with defaults already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct VoltagePayload {
    // ---
    pub voltage: f64,
    pub area: String,
    pub timestamp: String,
}

impl VoltagePayload {
    // ---
    /// Lenient decode: voltage 0, [`DEFAULT_AREA`] and the current time fill any gaps.
    pub fn from_json(body: &Value, clock: &dyn Clock) -> Self {
        let voltage = body.get("voltage").and_then(number_like).unwrap_or(0.0);
        let area = body
            .get("area")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AREA)
            .to_string();
        let timestamp = body
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| clock.now().to_rfc3339_opts(SecondsFormat::Secs, false));

        Self {
            voltage,
            area,
            timestamp,
        }
    }

    pub fn triggers_alert(&self) -> bool {
        self.voltage > ALERT_THRESHOLD
    }

    pub fn to_event(&self) -> SpikeEvent {
        SpikeEvent::new(self.voltage, self.area.clone(), severity_for(self.voltage))
            .with_info("Timestamp", self.timestamp.clone())
            .with_info("Threshold", format!("{ALERT_THRESHOLD}V"))
    }
}

/// Forward a reading to the notifier if it is above the threshold.
///
/// Returns `None` when the reading did not qualify.
pub async fn handle_voltage_data(
    notifier: &AlertNotifier,
    payload: &VoltagePayload,
) -> Option<SendOutcome> {
    // ---
    if !payload.triggers_alert() {
        debug!(
            "Voltage {:.1}V at {} within limits, no alert",
            payload.voltage, payload.area
        );
        return None;
    }
    Some(notifier.send(&payload.to_event()).await)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::clock::ManualClock;
    use crate::notifier::testing::RecordingMessenger;
    use chrono::{Duration, Local, TimeZone};
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<ManualClock>, Arc<RecordingMessenger>, AlertNotifier) {
        // ---
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
        ));
        let messenger = Arc::new(RecordingMessenger::default());
        let notifier = AlertNotifier::new(messenger.clone(), clock.clone(), Duration::seconds(300));
        (clock, messenger, notifier)
    }

    #[test]
    fn test_severity_classification() {
        // ---
        assert_eq!(severity_for(305.0), Severity::Critical);
        assert_eq!(severity_for(285.0), Severity::High);
        assert_eq!(severity_for(265.0), Severity::Medium);
        assert_eq!(severity_for(250.0), Severity::Low);
    }

    #[test]
    fn test_severity_boundaries_are_inclusive() {
        // ---
        assert_eq!(severity_for(300.0), Severity::Critical);
        assert_eq!(severity_for(280.0), Severity::High);
        assert_eq!(severity_for(260.0), Severity::Medium);
        assert_eq!(severity_for(299.99), Severity::High);
        assert_eq!(severity_for(279.99), Severity::Medium);
        assert_eq!(severity_for(259.99), Severity::Low);
    }

    #[test]
    fn test_payload_defaults() {
        // ---
        let clock = ManualClock::new(Local.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap());
        let payload = VoltagePayload::from_json(&json!({}), &clock);
        assert_eq!(payload.voltage, 0.0);
        assert_eq!(payload.area, DEFAULT_AREA);
        assert!(payload.timestamp.starts_with("2025-03-26T18:45:00"));
        assert!(!payload.triggers_alert());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // ---
        let (clock, messenger, notifier) = setup();

        let at_threshold = VoltagePayload::from_json(&json!({ "voltage": 234.0 }), clock.as_ref());
        let outcome = tokio_test::block_on(handle_voltage_data(&notifier, &at_threshold));
        assert_eq!(outcome, None);
        assert_eq!(messenger.attempts(), 0);

        let above = VoltagePayload::from_json(&json!({ "voltage": 234.1 }), clock.as_ref());
        let outcome = tokio_test::block_on(handle_voltage_data(&notifier, &above));
        assert_eq!(outcome, Some(SendOutcome::Delivered));
        assert_eq!(messenger.attempts(), 1);
    }

    #[tokio::test]
    async fn test_webhook_alert_carries_derived_severity_and_info() {
        // ---
        let (clock, messenger, notifier) = setup();
        let payload = VoltagePayload::from_json(
            &json!({
                "voltage": 310.2,
                "area": "Istanbul, Beşiktaş",
                "timestamp": "2025-03-26T18:44:59"
            }),
            clock.as_ref(),
        );
        assert_eq!(payload.to_event().severity, Severity::Critical);

        let outcome = handle_voltage_data(&notifier, &payload).await;
        assert_eq!(outcome, Some(SendOutcome::Delivered));

        let message = messenger.last().unwrap();
        assert!(message.contains("**Severity:** CRITICAL"));
        assert!(message.contains("**Area:** Istanbul, Beşiktaş"));
        assert!(message.contains("• Timestamp: 2025-03-26T18:44:59"));
        assert!(message.contains("• Threshold: 234V"));
    }

    #[tokio::test]
    async fn test_webhook_respects_cooldown() {
        // ---
        let (clock, messenger, notifier) = setup();
        let payload = VoltagePayload::from_json(&json!({ "voltage": 290 }), clock.as_ref());

        assert_eq!(
            handle_voltage_data(&notifier, &payload).await,
            Some(SendOutcome::Delivered)
        );
        assert_eq!(
            handle_voltage_data(&notifier, &payload).await,
            Some(SendOutcome::Suppressed)
        );
        assert_eq!(messenger.attempts(), 1);
    }
}
