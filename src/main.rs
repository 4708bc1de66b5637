//! Application entry point for the `voltwatch` backend service.
//!
//! This binary orchestrates the full startup sequence for the voltage spike
//! monitor, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Loading the recorded current log into the cyclic feed
//! - Building the alert notifier and probing the messaging destination
//! - Mounting all API routes via the `routes` gateway
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `VOLTWATCH_BIND_ADDR` (optional) – listen address (default: `0.0.0.0:5000`)
//! - `FEED_CSV_PATH` (optional) – recorded current log (default: `dc_current_log.csv`)
//! - `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID` (optional) – bot credentials
//! - `VOLTWATCH_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `VOLTWATCH_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the complete list.
use std::{env, io::IsTerminal, sync::Arc};

use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use voltwatch::{config, routes, AppState, SystemClock};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let addr = cfg.bind_addr;
    let static_dir = cfg.static_dir.clone();
    let telegram_configured = cfg.telegram_credentials().is_some();

    let state = Arc::new(AppState::from_config(cfg, Arc::new(SystemClock)));
    tracing::info!(
        "Feed ready: {} data points, source {}",
        state.feed.len(),
        state.feed.data_source()
    );

    if telegram_configured && !state.notifier.test_connection().await {
        tracing::warn!("Messaging destination unreachable, alerts will fail until it recovers");
    }

    // Build app from routes gateway
    let app = routes::router(state, &static_dir);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Install the global compact subscriber.
///
/// `FORCE_COLOR` overrides TTY colour detection, `VOLTWATCH_SPAN_EVENTS`
/// (`full` | `enter_exit`) widens span events beyond CLOSE, and `RUST_LOG`
/// wins over `VOLTWATCH_LOG_LEVEL`. Call once, before any logging.
fn init_tracing() {
    // ---
    let span_events = match env::var("VOLTWATCH_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = forced_color(env::var("FORCE_COLOR").ok().as_deref())
        .unwrap_or_else(|| std::io::stdout().is_terminal());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(fallback_directives(
            env::var("VOLTWATCH_LOG_LEVEL").ok().as_deref(),
        ))
    });

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}

/// `Some` when `FORCE_COLOR` pins colour on or off.
fn forced_color(value: Option<&str>) -> Option<bool> {
    match value.map(str::trim) {
        Some("1" | "true" | "yes") => Some(true),
        Some("0" | "false" | "no") => Some(false),
        _ => None,
    }
}

/// Filter used when `RUST_LOG` is absent. HTTP client chatter stays at info.
fn fallback_directives(level: Option<&str>) -> String {
    let level = level
        .and_then(|v| v.trim().parse::<Level>().ok())
        .unwrap_or(Level::DEBUG);
    format!(
        "{},hyper=info,reqwest=info",
        level.as_str().to_ascii_lowercase()
    )
}
