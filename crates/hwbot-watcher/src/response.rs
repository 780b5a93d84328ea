//! Homework API payload types and shape validation.

use serde_json::Value;

use crate::error::{Result, ShapeErrorKind, WatcherError};

/// A decoded reply from the homework status endpoint.
///
/// The body is kept as raw JSON until [`validate`] has checked its structure,
/// so a malformed reply is reported as a shape problem rather than a decode
/// failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    body: Value,
}

impl ApiResponse {
    /// Wraps an already decoded JSON body.
    #[must_use]
    pub const fn new(body: Value) -> Self {
        Self { body }
    }

    /// Returns the raw JSON body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the server timestamp to use as the next cursor.
    ///
    /// `None` if the key is missing or not an integer.
    #[must_use]
    pub fn current_date(&self) -> Option<i64> {
        self.body.get("current_date").and_then(Value::as_i64)
    }
}

/// A single homework submission as reported by the API.
///
/// Both fields are optional at this level; the interpreter decides what a
/// missing value means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Homework {
    /// Submission name, usually the repository or archive name.
    pub homework_name: Option<String>,

    /// Review status code.
    pub status: Option<String>,
}

impl Homework {
    /// Creates a fully populated homework entry.
    #[must_use]
    pub fn new(homework_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            homework_name: Some(homework_name.into()),
            status: Some(status.into()),
        }
    }

    /// Reads one entry of the `homeworks` list.
    ///
    /// Non-string field values keep their JSON text so the interpreter can
    /// name them in its error; `null` counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::Shape`] if the entry is not a JSON object.
    pub fn from_entry(entry: &Value) -> Result<Self> {
        let object = entry
            .as_object()
            .ok_or(WatcherError::shape(ShapeErrorKind::HomeworkNotObject))?;

        Ok(Self {
            homework_name: object.get("homework_name").and_then(raw_text),
            status: object.get("status").and_then(raw_text),
        })
    }
}

/// Checks the structure of an API reply and returns its `homeworks` list.
///
/// The list is returned untouched, in server order, which the API documents
/// as newest first. Entries are not inspected here.
///
/// # Errors
///
/// Returns [`WatcherError::Shape`] if the body is not an object, or if
/// `homeworks` is missing, not a list or empty.
///
/// # Examples
///
/// ```
/// use hwbot_watcher::{validate, ApiResponse};
///
/// let response = ApiResponse::new(serde_json::json!({
///     "homeworks": [{"homework_name": "hw1", "status": "approved"}],
///     "current_date": 1000
/// }));
/// let homeworks = validate(&response).unwrap();
/// assert_eq!(homeworks[0]["homework_name"], "hw1");
/// ```
pub fn validate(response: &ApiResponse) -> Result<&[Value]> {
    let object = response
        .body
        .as_object()
        .ok_or(WatcherError::shape(ShapeErrorKind::NotAnObject))?;

    let homeworks = object
        .get("homeworks")
        .ok_or(WatcherError::shape(ShapeErrorKind::MissingHomeworks))?
        .as_array()
        .ok_or(WatcherError::shape(ShapeErrorKind::HomeworksNotList))?;

    if homeworks.is_empty() {
        return Err(WatcherError::shape(ShapeErrorKind::NoHomeworks));
    }

    Ok(homeworks.as_slice())
}

/// Validates a reply and reads its newest entry.
///
/// Only the first entry is decoded, so a malformed older entry cannot hide
/// the latest status.
///
/// # Errors
///
/// Any error of [`validate`], or [`WatcherError::Shape`] if the newest entry
/// is not an object.
pub fn latest_homework(response: &ApiResponse) -> Result<Homework> {
    let homeworks = validate(response)?;
    let newest = homeworks
        .first()
        .ok_or(WatcherError::shape(ShapeErrorKind::NoHomeworks))?;
    Homework::from_entry(newest)
}

/// Renders a field value as text; non-string values keep their JSON form.
fn raw_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
