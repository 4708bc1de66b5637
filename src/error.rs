//! Errors raised by the messaging transport.
//!
//! These never escape the notifier: they are logged and folded into a
//! boolean or [`crate::notifier::SendOutcome`] at the call site.

use thiserror::Error;

// ---

#[derive(Debug, Error)]
pub enum TransportError {
    /// No bot token / destination id was configured.
    #[error("messaging destination is not configured")]
    NotConfigured,

    /// Network, TLS or HTTP-level failure talking to the Bot API.
    #[error("transport failure: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered but refused the request.
    #[error("bot API rejected request ({code}): {description}")]
    Api { code: i64, description: String },

    /// The Bot API answered with something we could not interpret.
    #[error("malformed bot API response: {0}")]
    MalformedResponse(String),
}
