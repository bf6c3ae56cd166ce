//! Field validation for task inputs.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::{Status, Task};

/// Boundary format for due dates: day-month-year, 24h time, zero-padded.
pub const DUE_DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

// chrono tolerates unpadded numbers, so the shape is pinned first.
static DUE_DATE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}-\d{2}-\d{4} \d{2}:\d{2}:\d{2}$")
        .expect("due date shape regex")
});

/// Rejections for task field inputs.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid date format, use 'dd-MM-yyyy HH:mm:ss'")]
    BadDateFormat,
    #[error("invalid status value")]
    BadStatus,
}

/// Parse a boundary due-date string, interpreted as UTC.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    if !DUE_DATE_SHAPE.is_match(raw) {
        return Err(ValidationError::BadDateFormat);
    }

    NaiveDateTime::parse_from_str(raw, DUE_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| ValidationError::BadDateFormat)
}

/// Render a stored due date back into the boundary format.
pub fn format_due_date(date: &DateTime<Utc>) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

/// Field set for a partial task update.
///
/// An absent or empty field leaves the corresponding [`Task`] field
/// unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

/// Validate every supplied field, then apply them all.
///
/// A single invalid field rejects the whole update with nothing applied.
pub fn apply_update(
    task: &mut Task,
    update: &TaskUpdate,
) -> Result<(), ValidationError> {
    let status = match present(&update.status) {
        Some(raw) => Some(Status::from_str(raw)?),
        None => None,
    };
    let due_date = match present(&update.due_date) {
        Some(raw) => Some(parse_due_date(raw)?),
        None => None,
    };

    if let Some(title) = present(&update.title) {
        task.title = title.to_owned();
    }
    if let Some(status) = status {
        task.status = status;
    }
    if let Some(due_date) = due_date {
        task.due_date = due_date;
    }

    Ok(())
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|raw| !raw.is_empty())
}
