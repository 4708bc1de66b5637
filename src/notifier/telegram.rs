//! Delivery transport for outbound alerts.
//!
//! [`Messenger`] is the seam the notifier talks through. Production uses the
//! Telegram Bot API over `reqwest`; when no credentials are configured the
//! [`DisabledMessenger`] stands in and reports every call as unconfigured.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::TransportError;

// ---

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// A single bot-style destination.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one Markdown-formatted message.
    async fn send_message(&self, text: &str) -> Result<(), TransportError>;

    /// Ask the destination who we are. Has no side effects.
    async fn identity(&self) -> Result<String, TransportError>;

    /// Destination id, for log lines.
    fn destination(&self) -> &str;
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    // ---
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl ApiResponse {
    // ---
    fn into_result(self) -> Result<Value, TransportError> {
        if self.ok {
            Ok(self.result.unwrap_or(Value::Null))
        } else {
            Err(TransportError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            })
        }
    }
}

/// Telegram Bot API client bound to one chat.
pub struct TelegramMessenger {
    // ---
    client: Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl TelegramMessenger {
    // ---
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn decode(response: reqwest::Response) -> Result<Value, TransportError> {
        // ---
        let status = response.status();
        let body = response.text().await?;
        debug!("Bot API answered {}: {}", status, body);

        let envelope: ApiResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedResponse(format!("{status}: {e}")))?;
        envelope.into_result()
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    // ---
    async fn send_message(&self, text: &str) -> Result<(), TransportError> {
        // ---
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;

        Self::decode(response).await.map(|_| ())
    }

    async fn identity(&self) -> Result<String, TransportError> {
        // ---
        let response = self.client.get(self.method_url("getMe")).send().await?;
        let me = Self::decode(response).await?;

        me.get("username")
            .and_then(Value::as_str)
            .map(|name| format!("@{name}"))
            .ok_or_else(|| TransportError::MalformedResponse("getMe without username".into()))
    }

    fn destination(&self) -> &str {
        &self.chat_id
    }
}

/// Stand-in used when no credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMessenger;

#[async_trait]
impl Messenger for DisabledMessenger {
    // ---
    async fn send_message(&self, _text: &str) -> Result<(), TransportError> {
        Err(TransportError::NotConfigured)
    }

    async fn identity(&self) -> Result<String, TransportError> {
        Err(TransportError::NotConfigured)
    }

    fn destination(&self) -> &str {
        "<unconfigured>"
    }
}
