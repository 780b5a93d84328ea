//! hwbot Telegram transport
//!
//! Minimal Telegram Bot API client used to deliver status notifications.
//!
//! This crate only knows how to send a plain text message to one chat; it has
//! no notion of homework, cursors or duplicate suppression.

mod bot;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bot::{TelegramBot, DEFAULT_API_URL};

/// Errors that can occur while talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// The bot token is empty or cannot be used in a request URL.
    #[error("invalid bot token: {0}")]
    InvalidToken(String),

    /// The request could not be sent or the reply could not be read.
    #[error("request to Bot API failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Bot API answered with a non-success status and no usable body.
    #[error("Bot API returned HTTP {status}")]
    Status {
        /// HTTP status code of the reply.
        status: u16,
    },

    /// The Bot API answered with `ok: false`.
    #[error("Bot API rejected the message ({code}): {description}")]
    Rejected {
        /// The `error_code` field, or the HTTP status if absent.
        code: u16,
        /// Human-readable reason from the API.
        description: String,
    },

    /// The reply body was not a Bot API envelope.
    #[error("invalid Bot API reply: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest<'a> {
    /// Target chat identifier or `@channel` username.
    pub chat_id: &'a str,
    /// UTF-8 message text.
    pub text: &'a str,
}

/// Envelope wrapped around every Bot API reply.
#[derive(Debug, Clone, Deserialize)]
pub struct BotApiResponse {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Error description when `ok` is false.
    #[serde(default)]
    pub description: Option<String>,
    /// Error code when `ok` is false.
    #[serde(default)]
    pub error_code: Option<u16>,
}

impl BotApiResponse {
    /// Converts a failed envelope into a [`TelegramError::Rejected`].
    #[must_use]
    pub fn into_rejection(self, fallback_code: u16) -> TelegramError {
        TelegramError::Rejected {
            code: self.error_code.unwrap_or(fallback_code),
            description: self
                .description
                .unwrap_or_else(|| "no description".to_string()),
        }
    }
}
