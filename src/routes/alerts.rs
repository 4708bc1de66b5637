// src/routes/alerts.rs
//! Alerting endpoints.
//!
//! Request bodies are decoded leniently: a missing field, a wrong type or
//! even a non-JSON body falls back to defaults instead of being rejected.
//! Every response is `200 OK` with a `success` flag; delivery problems are
//! reported there, never as a server error.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::number_like;
use crate::notifier::SendOutcome;
use crate::webhook::{handle_voltage_data, severity_for, VoltagePayload};
use crate::{AppState, Severity, SpikeEvent};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new()
        .route("/api/telegram-alert", post(submit_alert))
        .route("/api/voltage-webhook", post(voltage_webhook))
        .route("/api/test-telegram", get(test_telegram))
        .route("/api/system-status", post(system_status))
}

#[derive(Debug, Serialize)]
struct AlertResponse {
    success: bool,
    message: &'static str,
    outcome: SendOutcome,
}

#[derive(Debug, Serialize)]
struct WebhookResponse {
    success: bool,
    triggered: bool,
    severity: Severity,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct SimpleResponse {
    success: bool,
    message: &'static str,
}

fn lenient_json(body: &Bytes) -> Value {
    // ---
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!("Malformed request body, applying defaults: {}", e);
        Value::Null
    })
}

fn outcome_message(outcome: SendOutcome) -> &'static str {
    match outcome {
        SendOutcome::Delivered => "Alert sent successfully",
        SendOutcome::Failed => "Alert delivery failed",
        SendOutcome::Suppressed => "Alert suppressed: cooldown active",
    }
}

/// Handle `POST /api/telegram-alert` with a caller-supplied severity.
async fn submit_alert(State(state): State<Arc<AppState>>, body: Bytes) -> Json<AlertResponse> {
    // ---
    let event = SpikeEvent::from_json(&lenient_json(&body));
    info!(
        "POST /api/telegram-alert - {} {:.1}V at {}",
        event.severity, event.voltage, event.area
    );

    let outcome = state.notifier.send(&event).await;
    Json(AlertResponse {
        success: outcome.is_success(),
        message: outcome_message(outcome),
        outcome,
    })
}

/// Handle `POST /api/voltage-webhook`; severity is derived from the voltage.
async fn voltage_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<WebhookResponse> {
    // ---
    let payload = VoltagePayload::from_json(&lenient_json(&body), state.clock.as_ref());
    let severity = severity_for(payload.voltage);

    let response = match handle_voltage_data(&state.notifier, &payload).await {
        None => WebhookResponse {
            success: true,
            triggered: false,
            severity,
            message: "Voltage within limits",
        },
        Some(outcome) => WebhookResponse {
            success: outcome.is_success(),
            triggered: true,
            severity,
            message: outcome_message(outcome),
        },
    };
    Json(response)
}

/// Handle `GET /api/test-telegram`.
async fn test_telegram(State(state): State<Arc<AppState>>) -> Json<SimpleResponse> {
    // ---
    let success = state.notifier.test_connection().await;
    Json(SimpleResponse {
        success,
        message: if success {
            "Bot connection successful"
        } else {
            "Bot connection failed"
        },
    })
}

/// Handle `POST /api/system-status`; not rate limited.
async fn system_status(State(state): State<Arc<AppState>>, body: Bytes) -> Json<SimpleResponse> {
    // ---
    let body = lenient_json(&body);
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("ONLINE");
    let voltage = body.get("voltage").and_then(number_like);
    let uptime = body.get("uptime").and_then(Value::as_str);

    let success = state.notifier.send_status(status, voltage, uptime).await;
    Json(SimpleResponse {
        success,
        message: if success {
            "Status update sent"
        } else {
            "Status update failed"
        },
    })
}
