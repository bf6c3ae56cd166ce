//! Users read projections. Authorization required.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::task::validator::DUE_DATE_FORMAT;
use crate::task::{Status, Task};
use crate::user::User;
use crate::{AppState, ServerError};

// Fixed +05:30 display offset kept from the legacy read paths.
// Display only, stored values stay UTC.
const DISPLAY_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
const CREATED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn display_zone() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn render(date: &DateTime<Utc>, format: &str) -> String {
    date.with_timezone(&display_zone()).format(format).to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub task_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: String,
    pub status: Status,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub name: String,
    pub email: String,
    pub created_date: String,
    pub tasks: Vec<TaskView>,
}

fn view(user: User, tasks: Vec<Task>, due_date_format: &str) -> UserView {
    UserView {
        name: user.name,
        email: user.email,
        created_date: render(&user.created_at, CREATED_DATE_FORMAT),
        tasks: tasks
            .into_iter()
            .map(|task| TaskView {
                task_id: task.id,
                title: task.title,
                description: task.description,
                due_date: render(&task.due_date, due_date_format),
                status: task.status,
            })
            .collect(),
    }
}

/// Handler listing every user with their tasks.
pub async fn list_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserView>>> {
    let users = state.accounts().list_with_tasks().await?;

    Ok(Json(
        users
            .into_iter()
            .map(|(user, tasks)| view(user, tasks, DUE_DATE_FORMAT))
            .collect(),
    ))
}

/// Handler returning a single user with their tasks.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserView>> {
    let Some((user, tasks)) =
        state.accounts().find_with_tasks(user_id).await?
    else {
        return Err(ServerError::UnknownUser);
    };

    // This read path renders due dates like created dates.
    Ok(Json(view(user, tasks, CREATED_DATE_FORMAT)))
}
