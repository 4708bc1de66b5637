//! End-to-end tests: the real router served on a loopback port, a fake Bot
//! API standing in for the messaging destination, and `reqwest` as the client.

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Local, TimeZone};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use voltwatch::{routes, AppState, Config, ManualClock};

const SAMPLE_LOG: &str = "\
Timestamp,Current (A)
2025-03-26 18:45:00,0.10
2025-03-26 18:45:01,0.20
2025-03-26 18:45:02,0.30
2025-03-26 18:45:03,0.40
";

#[derive(Debug, Deserialize)]
struct ReadingResponse {
    timestamp: String,
    voltage: f64,
    current: f64,
    success: bool,
}

#[derive(Debug, Deserialize)]
struct RecentResponse {
    data: Vec<RecentReading>,
    success: bool,
}

#[derive(Debug, Deserialize)]
struct RecentReading {
    timestamp: String,
    voltage: f64,
}

#[derive(Debug, Deserialize)]
struct AlertResponse {
    success: bool,
    message: String,
    outcome: String,
}

// ---

/// Fake Bot API: records every `sendMessage` payload, optionally refusing them.
#[derive(Clone, Default)]
struct FakeBot {
    sent: Arc<Mutex<Vec<Value>>>,
    refuse: bool,
}

impl FakeBot {
    fn messages(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }
}

async fn fake_send_message(State(bot): State<FakeBot>, Json(body): Json<Value>) -> Json<Value> {
    bot.sent.lock().unwrap().push(body);
    if bot.refuse {
        Json(json!({ "ok": false, "error_code": 429, "description": "Too Many Requests" }))
    } else {
        Json(json!({ "ok": true, "result": { "message_id": 1 } }))
    }
}

async fn fake_get_me() -> Json<Value> {
    Json(json!({ "ok": true, "result": { "id": 7, "is_bot": true, "username": "volt_bot" } }))
}

async fn serve(router: Router) -> Result<SocketAddr> {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    Ok(addr)
}

async fn spawn_fake_bot(refuse: bool) -> Result<(FakeBot, String)> {
    // ---
    let bot = FakeBot {
        refuse,
        ..FakeBot::default()
    };
    let router = Router::new()
        .route("/{bot}/sendMessage", post(fake_send_message))
        .route("/{bot}/getMe", get(fake_get_me))
        .with_state(bot.clone());
    let addr = serve(router).await?;
    Ok((bot, format!("http://{addr}")))
}

struct TestApp {
    base: String,
    clock: Arc<ManualClock>,
    _dir: tempfile::TempDir,
}

/// Start the service with the given log contents and, optionally, a bot API URL.
async fn spawn_app(log: Option<&str>, bot_url: Option<String>) -> Result<TestApp> {
    // ---
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("dc_current_log.csv");
    if let Some(log) = log {
        std::fs::write(&csv_path, log)?;
    }
    std::fs::write(dir.path().join("index.html"), "<h1>Voltage Spike Monitor</h1>")?;

    let config = Config {
        bind_addr: "127.0.0.1:0".parse()?,
        csv_path,
        static_dir: PathBuf::from(dir.path()),
        recent_limit: 100,
        alert_cooldown_secs: 300,
        telegram_bot_token: bot_url.as_ref().map(|_| "123:test-token".to_string()),
        telegram_chat_id: bot_url.as_ref().map(|_| "4242".to_string()),
        telegram_api_url: bot_url.unwrap_or_else(|| "http://127.0.0.1:9".to_string()),
    };

    let clock = Arc::new(ManualClock::new(
        Local.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
    ));
    let static_dir = config.static_dir.clone();
    let state = Arc::new(AppState::from_config(config, clock.clone()));
    let addr = serve(routes::router(state, &static_dir)).await?;

    Ok(TestApp {
        base: format!("http://{addr}"),
        clock,
        _dir: dir,
    })
}

// ---

#[tokio::test]
async fn voltage_feed_cycles_through_log() -> Result<()> {
    // ---
    let app = spawn_app(Some(SAMPLE_LOG), None).await?;
    let client = Client::new();
    let url = format!("{}/api/voltage-data", app.base);

    let mut seen = Vec::new();
    for _ in 0..5 {
        let r: ReadingResponse = client.get(&url).send().await?.json().await?;
        assert!(r.success);
        seen.push(r);
    }

    assert_eq!(seen[0].timestamp, "2025-03-26 18:45:00");
    assert!((seen[0].voltage - 230.0).abs() < 1e-9);
    assert!((seen[0].current - 0.1).abs() < 1e-9);
    assert_eq!(seen[3].timestamp, "2025-03-26 18:45:03");
    assert_eq!(seen[4].timestamp, seen[0].timestamp, "feed should wrap");

    Ok(())
}

#[tokio::test]
async fn recent_readings_do_not_move_cursor() -> Result<()> {
    // ---
    let app = spawn_app(Some(SAMPLE_LOG), None).await?;
    let client = Client::new();

    let first: ReadingResponse = client
        .get(format!("{}/api/voltage-data", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(first.timestamp, "2025-03-26 18:45:00");

    let recent: RecentResponse = client
        .get(format!("{}/api/csv-data?limit=2", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert!(recent.success);
    assert_eq!(recent.data.len(), 2);
    assert_eq!(recent.data[0].timestamp, "2025-03-26 18:45:02");
    assert_eq!(recent.data[1].timestamp, "2025-03-26 18:45:03");
    assert!((recent.data[1].voltage - 260.0).abs() < 1e-9);

    let all: RecentResponse = client
        .get(format!("{}/api/csv-data", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all.data.len(), 4);

    let second: ReadingResponse = client
        .get(format!("{}/api/voltage-data", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(second.timestamp, "2025-03-26 18:45:01");

    Ok(())
}

#[tokio::test]
async fn malformed_recent_limit_uses_default() -> Result<()> {
    // ---
    let app = spawn_app(Some(SAMPLE_LOG), None).await?;
    let client = Client::new();

    for limit in ["abc", "-1", ""] {
        let resp = client
            .get(format!("{}/api/csv-data?limit={limit}", app.base))
            .send()
            .await?;
        assert_eq!(resp.status(), 200, "limit={limit:?}");

        let recent: RecentResponse = resp.json().await?;
        assert!(recent.success);
        assert_eq!(recent.data.len(), 4, "limit={limit:?}");
    }

    Ok(())
}

#[tokio::test]
async fn missing_log_serves_synthetic_readings() -> Result<()> {
    // ---
    let app = spawn_app(None, None).await?;
    let client = Client::new();

    let status: Value = client
        .get(format!("{}/api/status", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(status["status"], "online");
    assert_eq!(status["data_source"], "Simulated");
    assert_eq!(status["telegram_configured"], false);

    for _ in 0..10 {
        let r: ReadingResponse = client
            .get(format!("{}/api/voltage-data", app.base))
            .send()
            .await?
            .json()
            .await?;
        assert!((210.0..=230.0).contains(&r.voltage));
        assert!((0.0..=0.5).contains(&r.current));
        assert_eq!(r.timestamp, "18:45:00");
    }

    Ok(())
}

#[tokio::test]
async fn alerts_are_rate_limited() -> Result<()> {
    // ---
    let (bot, bot_url) = spawn_fake_bot(false).await?;
    let app = spawn_app(Some(SAMPLE_LOG), Some(bot_url)).await?;
    let client = Client::new();
    let url = format!("{}/api/telegram-alert", app.base);
    let spike = json!({ "voltage": 310.2, "area": "Istanbul, Beşiktaş", "severity": "CRITICAL" });

    let first: AlertResponse = client.post(&url).json(&spike).send().await?.json().await?;
    assert!(first.success);
    assert_eq!(first.outcome, "delivered");

    let second: AlertResponse = client.post(&url).json(&spike).send().await?.json().await?;
    assert!(!second.success);
    assert_eq!(second.outcome, "suppressed");

    let messages = bot.messages();
    assert_eq!(messages.len(), 1, "suppressed alert must not reach the bot");
    assert_eq!(messages[0]["chat_id"], "4242");
    assert_eq!(messages[0]["parse_mode"], "Markdown");
    let text = messages[0]["text"].as_str().unwrap_or_default();
    assert!(text.contains("**Severity:** CRITICAL"));
    assert!(text.contains("**Voltage:** 310.2V"));

    app.clock.advance(Duration::seconds(300));
    let third: AlertResponse = client.post(&url).json(&spike).send().await?.json().await?;
    assert_eq!(third.outcome, "delivered");
    assert_eq!(bot.messages().len(), 2);

    Ok(())
}

#[tokio::test]
async fn malformed_alert_gets_defaults() -> Result<()> {
    // ---
    let (bot, bot_url) = spawn_fake_bot(false).await?;
    let app = spawn_app(None, Some(bot_url)).await?;
    let client = Client::new();

    let response: AlertResponse = client
        .post(format!("{}/api/telegram-alert", app.base))
        .header("content-type", "text/plain")
        .body("this is not json")
        .send()
        .await?
        .json()
        .await?;
    assert!(response.success);
    assert_eq!(response.message, "Alert sent successfully");

    let text = bot.messages()[0]["text"].as_str().unwrap_or_default().to_string();
    assert!(text.contains("**Severity:** HIGH"));
    assert!(text.contains("**Area:** Unknown Area"));
    assert!(text.contains("**Voltage:** 0.0V"));

    Ok(())
}

#[tokio::test]
async fn failed_delivery_still_starts_cooldown() -> Result<()> {
    // ---
    let (bot, bot_url) = spawn_fake_bot(true).await?;
    let app = spawn_app(None, Some(bot_url)).await?;
    let client = Client::new();
    let url = format!("{}/api/telegram-alert", app.base);
    let spike = json!({ "voltage": 285.8, "area": "Istanbul, Şişli", "severity": "HIGH" });

    let first: AlertResponse = client.post(&url).json(&spike).send().await?.json().await?;
    assert!(!first.success);
    assert_eq!(first.outcome, "failed");

    app.clock.advance(Duration::seconds(60));
    let second: AlertResponse = client.post(&url).json(&spike).send().await?.json().await?;
    assert_eq!(second.outcome, "suppressed");
    assert_eq!(bot.messages().len(), 1);

    Ok(())
}

#[tokio::test]
async fn webhook_threshold_and_severity() -> Result<()> {
    // ---
    let (bot, bot_url) = spawn_fake_bot(false).await?;
    let app = spawn_app(None, Some(bot_url)).await?;
    let client = Client::new();
    let url = format!("{}/api/voltage-webhook", app.base);

    let quiet: Value = client
        .post(&url)
        .json(&json!({ "voltage": 234.0 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(quiet["triggered"], false);
    assert_eq!(quiet["success"], true);
    assert!(bot.messages().is_empty());

    let loud: Value = client
        .post(&url)
        .json(&json!({ "voltage": 234.1, "area": "Istanbul, Fatih" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(loud["triggered"], true);
    assert_eq!(loud["success"], true);
    assert_eq!(loud["severity"], "LOW");

    let text = bot.messages()[0]["text"].as_str().unwrap_or_default().to_string();
    assert!(text.contains("**Area:** Istanbul, Fatih"));
    assert!(text.contains("• Threshold: 234V"));

    Ok(())
}

#[tokio::test]
async fn unconfigured_destination_reports_failure() -> Result<()> {
    // ---
    let app = spawn_app(Some(SAMPLE_LOG), None).await?;
    let client = Client::new();

    let probe: Value = client
        .get(format!("{}/api/test-telegram", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(probe["success"], false);

    let alert = client
        .post(format!("{}/api/telegram-alert", app.base))
        .json(&json!({ "voltage": 300.0 }))
        .send()
        .await?;
    assert_eq!(alert.status(), reqwest::StatusCode::OK);
    let alert: AlertResponse = alert.json().await?;
    assert!(!alert.success);
    assert_eq!(alert.outcome, "failed");

    Ok(())
}

#[tokio::test]
async fn connection_probe_and_status_update() -> Result<()> {
    // ---
    let (bot, bot_url) = spawn_fake_bot(false).await?;
    let app = spawn_app(None, Some(bot_url)).await?;
    let client = Client::new();

    let probe: Value = client
        .get(format!("{}/api/test-telegram", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(probe["success"], true);
    assert!(bot.messages().is_empty(), "probe must not send messages");

    let status: Value = client
        .post(format!("{}/api/system-status", app.base))
        .json(&json!({ "status": "MAINTENANCE", "voltage": 221.37, "uptime": "2h" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(status["success"], true);

    let text = bot.messages()[0]["text"].as_str().unwrap_or_default().to_string();
    assert!(text.starts_with("🟡 *SYSTEM STATUS UPDATE*"));
    assert!(text.contains("**Current Voltage:** 221.4V"));
    assert!(text.contains("**Uptime:** 2h"));

    Ok(())
}

#[tokio::test]
async fn serves_front_end_and_health() -> Result<()> {
    // ---
    let app = spawn_app(None, None).await?;
    let client = Client::new();

    let index = client.get(format!("{}/", app.base)).send().await?;
    assert_eq!(index.status(), reqwest::StatusCode::OK);
    assert!(index.text().await?.contains("Voltage Spike Monitor"));

    let health: Value = client
        .get(format!("{}/health", app.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["status"], "ok");

    Ok(())
}
