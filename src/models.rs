//! Data models for the voltage feed and spike alerts.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---

/// Baseline of the placeholder current → voltage model.
pub const VOLTAGE_BASELINE: f64 = 220.0;

/// Gain of the placeholder current → voltage model.
pub const VOLTAGE_GAIN: f64 = 100.0;

/// Area label used when a spike report does not name one.
pub const DEFAULT_AREA: &str = "Unknown Area";

/// One row of the recorded current log.
#[derive(Debug, Deserialize)]
pub struct RawReading {
    // ---
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Current (A)")]
    pub current: f64,
}

/// A feed entry as served to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    pub timestamp: String,
    pub current: f64,
    pub voltage: f64,
}

impl Reading {
    // ---
    /// Build a reading from a current sample, deriving voltage with the fixed linear model.
    pub fn from_current(timestamp: impl Into<String>, current: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            current,
            voltage: VOLTAGE_BASELINE + current * VOLTAGE_GAIN,
        }
    }
}

impl RawReading {
    // ---
    pub fn to_reading(&self) -> Reading {
        Reading::from_current(self.timestamp.clone(), self.current)
    }
}

/// Coarse danger classification, ordered LOW < MEDIUM < HIGH < CRITICAL.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    #[default]
    High,
    Critical,
}

impl Severity {
    // ---
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Recognize a severity label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(label))
    }

    /// Like [`Severity::parse`], but anything unrecognized becomes `High`.
    pub fn parse_or_default(label: Option<&str>) -> Self {
        label.and_then(Self::parse).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A report that voltage exceeded a concerning level somewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeEvent {
    // ---
    pub voltage: f64,
    pub area: String,
    pub severity: Severity,
    /// Extra key/value lines appended to the alert, in insertion order.
    pub additional_info: Vec<(String, String)>,
}

impl SpikeEvent {
    // ---
    pub fn new(voltage: f64, area: impl Into<String>, severity: Severity) -> Self {
        Self {
            voltage,
            area: area.into(),
            severity,
            additional_info: Vec::new(),
        }
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_info.push((key.into(), value.into()));
        self
    }

    /// Build an event from an arbitrary JSON submission.
    ///
    /// Never fails: a missing or non-numeric voltage becomes 0, a missing or
    /// blank area becomes [`DEFAULT_AREA`], and an unrecognized severity
    /// becomes [`Severity::High`].
    pub fn from_json(body: &Value) -> Self {
        // ---
        let voltage = body.get("voltage").and_then(number_like).unwrap_or(0.0);
        let area = body
            .get("area")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AREA);
        let severity = Severity::parse_or_default(body.get("severity").and_then(Value::as_str));

        let additional_info = body
            .get("additional_info")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), display_value(v)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            voltage,
            area: area.to_string(),
            severity,
            additional_info,
        }
    }
}

/// Accept numbers and numeric strings.
pub(crate) fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
