//! Markdown rendering for alert and status messages.

use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::models::{Severity, SpikeEvent};

// ---

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RECOMMENDED_ACTIONS: [&str; 4] = [
    "Turn off sensitive electronics",
    "Unplug expensive equipment",
    "Check circuit breakers",
    "Monitor for additional spikes",
];

const STATUS_MARKERS: [(&str, &str); 3] = [
    ("ONLINE", "🟢"),
    ("OFFLINE", "🔴"),
    ("MAINTENANCE", "🟡"),
];

const NEUTRAL_MARKER: &str = "⚪";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motif {
    pub emoji: &'static str,
    pub color: &'static str,
}

/// Headline emoji and colour marker for each severity.
pub fn motif_for(severity: Severity) -> Motif {
    let (emoji, color) = match severity {
        Severity::Low => ("⚠️", "🟡"),
        Severity::Medium => ("⚡", "🟠"),
        Severity::High => ("🚨", "🔴"),
        Severity::Critical => ("💥", "🔴"),
    };
    Motif { emoji, color }
}

/// Marker for a status label; unknown labels get a neutral one.
pub fn status_marker(status: &str) -> &'static str {
    STATUS_MARKERS
        .iter()
        .find(|(label, _)| *label == status)
        .map(|(_, marker)| *marker)
        .unwrap_or(NEUTRAL_MARKER)
}

/// Render a spike alert.
pub fn render_alert(event: &SpikeEvent, at: DateTime<Local>) -> String {
    // ---
    let Motif { emoji, color } = motif_for(event.severity);

    let mut message = format!(
        "{emoji} *VOLTAGE SPIKE ALERT* {emoji}\n\n\
         {color} **Severity:** {severity}\n\
         ⚡ **Voltage:** {voltage:.1}V\n\
         📍 **Area:** {area}\n\
         🕐 **Time:** {time}\n\n\
         🚨 **IMMEDIATE ACTION REQUIRED:**\n",
        severity = event.severity,
        voltage = event.voltage,
        area = event.area,
        time = at.format(TIME_FORMAT),
    );
    for action in RECOMMENDED_ACTIONS {
        let _ = writeln!(message, "• {action}");
    }
    message.push_str("\n⚠️ *This is an automated alert from your voltage monitoring system*");

    if !event.additional_info.is_empty() {
        message.push_str("\n\n📊 **Additional Data:**\n");
        for (key, value) in &event.additional_info {
            let _ = writeln!(message, "• {key}: {value}");
        }
    }

    message
}

/// Render a heartbeat-style status update.
pub fn render_status(
    status: &str,
    voltage: Option<f64>,
    uptime: Option<&str>,
    at: DateTime<Local>,
) -> String {
    // ---
    let mut message = format!(
        "{marker} *SYSTEM STATUS UPDATE*\n\n**Status:** {status}\n**Time:** {time}\n",
        marker = status_marker(status),
        time = at.format(TIME_FORMAT),
    );
    if let Some(voltage) = voltage {
        let _ = writeln!(message, "**Current Voltage:** {voltage:.1}V");
    }
    if let Some(uptime) = uptime {
        let _ = writeln!(message, "**Uptime:** {uptime}");
    }
    message
}
