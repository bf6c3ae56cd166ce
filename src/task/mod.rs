mod service;
pub mod validator;

pub use service::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::task::validator::ValidationError;

/// Task as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub status: Status,
}

/// Progress of a [`Task`].
///
/// Plain enumeration, no transition graph: any status may be set to any
/// other status via update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    NotStarted,
    Started,
    Pending,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotStarted => "NotStarted",
            Status::Started => "Started",
            Status::Pending => "Pending",
            Status::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    /// Case-sensitive match on the four labels.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "NotStarted" => Ok(Status::NotStarted),
            "Started" => Ok(Status::Started),
            "Pending" => Ok(Status::Pending),
            "Completed" => Ok(Status::Completed),
            _ => Err(ValidationError::BadStatus),
        }
    }
}
