//! Error types for the homework watcher.
//!
//! Every failure a poll cycle can run into has its own variant so the loop
//! can decide, per kind, whether to abort, log and skip, or raise an alert.

use std::fmt;
use std::path::PathBuf;

/// A specialized `Result` type for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur while polling, interpreting and notifying.
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    // ========================================================================
    // Startup Errors (fatal)
    // ========================================================================
    /// One or more required credentials are absent or empty.
    #[error("Missing required environment variables: {}\n\nSuggestion: Export them or put them in a .env file", .names.join(", "))]
    MissingCredentials {
        /// Names of the missing variables, in declaration order.
        names: Vec<&'static str>,
    },

    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your hwbot.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Fetch Errors (logged, cycle skipped)
    // ========================================================================
    /// The request never produced a usable reply (DNS, timeout, reset).
    #[error("Homework API is unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The API answered with a non-success status code.
    #[error("Homework API returned HTTP {status}")]
    UpstreamStatus {
        /// Observed HTTP status code.
        status: u16,
    },

    /// The reply body is not valid JSON.
    #[error("Homework API returned a malformed body: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    // ========================================================================
    // Payload Errors
    // ========================================================================
    /// The decoded reply does not have the documented structure.
    #[error("Unexpected API response shape: {kind}")]
    Shape {
        /// Which structural check failed.
        kind: ShapeErrorKind,
    },

    /// A homework entry has no `homework_name`.
    #[error("Homework entry has no 'homework_name'")]
    MissingName,

    /// A homework entry carries a status outside the known verdicts.
    #[error("Unknown homework status: '{status}'")]
    UnknownStatus {
        /// The raw status value, or `<missing>` if absent.
        status: String,
    },

    // ========================================================================
    // Delivery Errors (swallowed by the loop)
    // ========================================================================
    /// The chat transport failed to deliver a message.
    #[error("Failed to deliver notification: {0}")]
    Notify(#[from] hwbot_telegram::TelegramError),
}

/// Which structural check of an API response failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeErrorKind {
    /// Top-level value is not a JSON object.
    NotAnObject,
    /// The `homeworks` key is absent.
    MissingHomeworks,
    /// The `homeworks` value is not a list.
    HomeworksNotList,
    /// The `homeworks` list is empty: nothing submitted in the window.
    NoHomeworks,
    /// An entry of `homeworks` is not a JSON object.
    HomeworkNotObject,
}

impl fmt::Display for ShapeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "response is not a JSON object"),
            Self::MissingHomeworks => write!(f, "no 'homeworks' key"),
            Self::HomeworksNotList => write!(f, "'homeworks' is not a list"),
            Self::NoHomeworks => write!(f, "'homeworks' is empty"),
            Self::HomeworkNotObject => write!(f, "'homeworks' entry is not an object"),
        }
    }
}

impl WatcherError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `Shape` error.
    #[must_use]
    pub const fn shape(kind: ShapeErrorKind) -> Self {
        Self::Shape { kind }
    }

    /// Creates a new `UnknownStatus` error.
    #[must_use]
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            status: status.into(),
        }
    }

    /// Returns `true` if this error must terminate the process.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials { .. }
                | Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
        )
    }

    /// Returns `true` if the error happened before a response was decoded.
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::UpstreamStatus { .. } | Self::MalformedResponse(_)
        )
    }

    /// Returns `true` if the poll loop should raise a chat alert for this error.
    ///
    /// Fetch and shape failures are only logged: an outage of the homework API
    /// would otherwise flood the chat. Delivery failures are never alerted
    /// through the channel that just failed.
    #[must_use]
    pub const fn should_alert(&self) -> bool {
        matches!(self, Self::MissingName | Self::UnknownStatus { .. })
    }

    /// Returns `true` for the benign "nothing submitted yet" condition.
    #[must_use]
    pub const fn is_no_homeworks(&self) -> bool {
        matches!(
            self,
            Self::Shape {
                kind: ShapeErrorKind::NoHomeworks
            }
        )
    }
}
