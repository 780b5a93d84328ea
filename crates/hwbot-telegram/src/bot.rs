//! Bot API client.
//!
//! This module provides the [`TelegramBot`] struct which posts messages to
//! the `sendMessage` method of the Telegram Bot API.

use std::fmt;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::{BotApiResponse, SendMessageRequest, TelegramError};

/// Public Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A Telegram bot identified by its token.
///
/// # Example
///
/// ```no_run
/// use hwbot_telegram::TelegramBot;
///
/// # async fn example() -> Result<(), hwbot_telegram::TelegramError> {
/// let bot = TelegramBot::new("123456:ABC-DEF")?;
/// bot.send_message("987654", "hello").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TelegramBot {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramBot")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TelegramBot {
    /// Creates a bot for the public Bot API with the default timeout.
    pub fn new(token: impl Into<String>) -> Result<Self, TelegramError> {
        Self::with_options(token, DEFAULT_API_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a bot against a custom API base URL and request timeout.
    ///
    /// A custom base URL is useful for self-hosted Bot API servers and for
    /// tests against a mock server.
    pub fn with_options(
        token: impl Into<String>,
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(TelegramError::InvalidToken("token is empty".to_string()));
        }
        if token.contains(['/', '?', '#']) || token.chars().any(char::is_whitespace) {
            return Err(TelegramError::InvalidToken(
                "token contains characters not allowed in a URL path".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Returns the API base URL this bot talks to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Sends a plain text message to a chat.
    ///
    /// # Errors
    ///
    /// - [`TelegramError::Request`] on transport failure
    /// - [`TelegramError::Rejected`] if the API answers `ok: false`
    /// - [`TelegramError::Status`] for a non-success reply without an envelope
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let body = SendMessageRequest { chat_id, text };

        // reqwest errors carry the request URL, which embeds the token.
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let raw = response.text().await.map_err(reqwest::Error::without_url)?;

        match serde_json::from_str::<BotApiResponse>(&raw) {
            Ok(reply) if reply.ok && status.is_success() => {
                debug!("message delivered");
                Ok(())
            }
            Ok(reply) => Err(reply.into_rejection(status.as_u16())),
            Err(_) if !status.is_success() => Err(TelegramError::Status {
                status: status.as_u16(),
            }),
            Err(e) => Err(TelegramError::Decode(e)),
        }
    }
}
