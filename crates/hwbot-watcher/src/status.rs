//! Review status codes and the notification text built from them.

use std::fmt;

use crate::error::{Result, WatcherError};
use crate::response::Homework;

/// Prefix of the alert sent when a cycle fails.
pub const FAILURE_PREFIX: &str = "Сбой в работе программы";

/// Review status of a homework submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeworkStatus {
    /// Reviewer accepted the work.
    Approved,
    /// A reviewer has picked the work up.
    Reviewing,
    /// Reviewer sent the work back with remarks.
    Rejected,
}

impl HomeworkStatus {
    /// All known statuses.
    pub const ALL: [Self; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Parses an API status code. Matching is exact.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Returns the API status code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Returns the human-readable verdict for this status.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwbot_watcher::HomeworkStatus;
    ///
    /// assert_eq!(HomeworkStatus::Reviewing.verdict(), "Работа взята на проверку ревьюером.");
    /// ```
    #[must_use]
    pub const fn verdict(&self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Builds the notification text for a homework entry.
///
/// # Errors
///
/// - [`WatcherError::MissingName`] if `homework_name` is absent
/// - [`WatcherError::UnknownStatus`] if `status` is absent or not a known code
pub fn interpret(homework: &Homework) -> Result<String> {
    let name = homework
        .homework_name
        .as_deref()
        .ok_or(WatcherError::MissingName)?;

    let raw_status = homework.status.as_deref().unwrap_or("<missing>");
    let status =
        HomeworkStatus::from_code(raw_status).ok_or_else(|| WatcherError::unknown_status(raw_status))?;

    Ok(format!(
        "Изменился статус проверки работы \"{name}\". {}",
        status.verdict()
    ))
}

/// Builds the alert text for a failed cycle.
#[must_use]
pub fn failure_message(error: &WatcherError) -> String {
    format!("{FAILURE_PREFIX}: {error}")
}
