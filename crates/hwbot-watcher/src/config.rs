//! Configuration types for the homework watcher.
//!
//! Credentials always come from the environment. Everything else has a
//! sensible default and may be overridden through an optional `hwbot.json`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatcherError};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "hwbot.json";

/// Environment variable holding the homework API token.
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the destination chat identifier.
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Default homework status endpoint.
fn default_endpoint() -> String {
    "https://practicum.yandex.ru/api/user_api/homework_statuses/".to_string()
}

/// Default Telegram Bot API base URL.
fn default_telegram_api_url() -> String {
    hwbot_telegram::DEFAULT_API_URL.to_string()
}

/// Default pause between two poll cycles, in seconds.
const fn default_retry_period() -> u64 {
    600
}

/// Default timeout for a single outbound request, in seconds.
const fn default_request_timeout() -> u64 {
    30
}

/// Default value for boolean options that default to true.
const fn default_true() -> bool {
    true
}

/// Tunables for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Homework status endpoint queried each cycle.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Base URL of the Telegram Bot API.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Fixed delay between cycles in seconds.
    #[serde(default = "default_retry_period")]
    pub retry_period_secs: u64,

    /// Upper bound for one outbound HTTP request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Send an identical failure alert only once in a row.
    #[serde(default = "default_true")]
    pub suppress_repeated_alerts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            telegram_api_url: default_telegram_api_url(),
            retry_period_secs: default_retry_period(),
            request_timeout_secs: default_request_timeout(),
            suppress_repeated_alerts: default_true(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `hwbot.json`; returns defaults if it does not exist.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            WatcherError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `hwbot.json` inside a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `WatcherError::ConfigParseError` if the file exists but is not
    /// valid JSON, and `WatcherError::ConfigValidationError` if a value is out
    /// of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(WatcherError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| WatcherError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `WatcherError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.retry_period_secs == 0 {
            return Err(WatcherError::config_validation(
                "retryPeriodSecs must be greater than 0",
                "Set retryPeriodSecs to at least 1 second in your hwbot.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(WatcherError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 second in your hwbot.json",
            ));
        }

        for (field, value) in [
            ("endpoint", &self.endpoint),
            ("telegramApiUrl", &self.telegram_api_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(WatcherError::config_validation(
                    format!("{field} must be an http(s) URL, got '{value}'"),
                    format!("Fix {field} in your hwbot.json or remove it to use the default"),
                ));
            }
        }

        Ok(())
    }

    /// Returns the delay between cycles.
    #[must_use]
    pub const fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// The three secrets the bot needs to run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Token for the homework API (`Authorization: OAuth <token>`).
    pub practicum_token: String,
    /// Telegram bot token.
    pub telegram_token: String,
    /// Destination chat identifier.
    pub telegram_chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads credentials through an arbitrary variable lookup.
    ///
    /// Values are trimmed. Empty values count as missing, and every missing
    /// name is reported at once.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_watcher::{Credentials, WatcherError};
    ///
    /// let err = Credentials::from_lookup(|_| None).unwrap_err();
    /// assert!(matches!(err, WatcherError::MissingCredentials { ref names } if names.len() == 3));
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut read = |name: &'static str| {
            let value = lookup(name)
                .map(|v| v.trim().to_string())
                .unwrap_or_default();
            if value.is_empty() {
                missing.push(name);
            }
            value
        };

        let practicum_token = read(PRACTICUM_TOKEN_VAR);
        let telegram_token = read(TELEGRAM_TOKEN_VAR);
        let telegram_chat_id = read(TELEGRAM_CHAT_ID_VAR);

        if !missing.is_empty() {
            return Err(WatcherError::MissingCredentials { names: missing });
        }

        Ok(Self {
            practicum_token,
            telegram_token,
            telegram_chat_id,
        })
    }
}
