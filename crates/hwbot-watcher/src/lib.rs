//! hwbot homework watcher
//!
//! Polls the homework review API, turns the newest status into a message and
//! forwards changes to a chat.

pub mod api;
pub mod config;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod response;
pub mod status;

pub use api::{HomeworkSource, PracticumClient};
pub use config::{
    Config, Credentials, PRACTICUM_TOKEN_VAR, TELEGRAM_CHAT_ID_VAR, TELEGRAM_TOKEN_VAR,
};
pub use error::{Result, ShapeErrorKind, WatcherError};
pub use notifier::{Notifier, TelegramNotifier};
pub use poller::{CycleOutcome, CyclePhase, PollState, Poller};
pub use response::{latest_homework, validate, ApiResponse, Homework};
pub use status::{failure_message, interpret, HomeworkStatus, FAILURE_PREFIX};
