//! Task lifecycle HTTP API. Authorization required.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::task::validator::{TaskUpdate, format_due_date};
use crate::task::{Status, Task};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub user_id: i64,
    #[validate(length(min = 1, message = "Title must not be empty."))]
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    /// Format: 'dd-MM-yyyy HH:mm:ss'. Example: '25-12-2024 15:30:00'.
    pub due_date: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub task_id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: String,
    pub status: Status,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.id,
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            due_date: format_due_date(&task.due_date),
            status: task.status,
        }
    }
}

/// Handler to create a task for a user.
pub async fn create_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Body>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>)> {
    let Json(body) = body?;
    body.validate()?;

    state
        .tasks()
        .create(
            body.user_id,
            &body.title,
            body.description,
            &body.status,
            &body.due_date,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Message {
            message: "Task created successfully.".to_owned(),
        }),
    ))
}

/// Handler listing every task owned by a user.
pub async fn list_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<TaskResponse>>> {
    let tasks = state.tasks().list_for_user(user_id).await?;

    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// Handler for partial task updates.
pub async fn update_handler(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    body: std::result::Result<Json<TaskUpdate>, JsonRejection>,
) -> Result<Json<Message>> {
    let Json(update) = body?;

    state.tasks().update(task_id, &update).await?;

    Ok(Json(Message {
        message: "Task updated successfully.".to_owned(),
    }))
}

/// Handler to delete a task by id.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Message>> {
    state.tasks().delete(task_id).await?;

    Ok(Json(Message {
        message: "Task deleted successfully.".to_owned(),
    }))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    async fn register(state: &AppState) -> i64 {
        state
            .accounts()
            .register("Ann", "ann@x.com", "secret1")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_token() {
        let state = router::state();
        register(&state).await;
        let app = app(state);

        let response = make_request(
            None,
            app,
            Method::POST,
            "/tasks",
            json!({
                "userId": 1,
                "title": "Buy milk",
                "status": "NotStarted",
                "dueDate": "25-12-2024 15:30:00",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_with_unknown_owner() {
        let state = router::state();
        let app = app(state.clone());

        let response = make_request(
            Some(&state),
            app,
            Method::POST,
            "/tasks",
            json!({
                "userId": 42,
                "title": "Buy milk",
                "status": "NotStarted",
                "dueDate": "25-12-2024 15:30:00",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_with_bad_date() {
        let state = router::state();
        let owner = register(&state).await;
        let app = app(state.clone());

        let response = make_request(
            Some(&state),
            app,
            Method::POST,
            "/tasks",
            json!({
                "userId": owner,
                "title": "Buy milk",
                "status": "NotStarted",
                "dueDate": "2024-12-25 15:30:00",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let state = router::state();
        let owner = register(&state).await;
        let app = app(state.clone());

        // Create.
        let response = make_request(
            Some(&state),
            app.clone(),
            Method::POST,
            "/tasks",
            json!({
                "userId": owner,
                "title": "Buy milk",
                "description": "2 liters",
                "status": "NotStarted",
                "dueDate": "25-12-2024 15:30:00",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // List.
        let path = format!("/tasks/{owner}");
        let response = make_request(
            Some(&state),
            app.clone(),
            Method::GET,
            &path,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body[0]["title"], "Buy milk");
        assert_eq!(body[0]["status"], "NotStarted");
        assert_eq!(body[0]["dueDate"], "25-12-2024 15:30:00");
        let task_id = body[0]["taskId"].as_i64().unwrap();

        // Update the status, nothing else.
        let path = format!("/tasks/{task_id}");
        let response = make_request(
            Some(&state),
            app.clone(),
            Method::PUT,
            &path,
            json!({ "status": "Completed" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let task = state.tasks().get_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, task::Status::Completed);
        assert_eq!(task.title, "Buy milk");

        // Delete.
        let response = make_request(
            Some(&state),
            app.clone(),
            Method::DELETE,
            &path,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        // List again: nothing left is a 404.
        let path = format!("/tasks/{owner}");
        let response = make_request(
            Some(&state),
            app,
            Method::GET,
            &path,
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_with_malformed_date() {
        let state = router::state();
        let owner = register(&state).await;
        let task_id = state
            .tasks()
            .create(owner, "Buy milk", None, "NotStarted", "25-12-2024 15:30:00")
            .await
            .unwrap();
        let app = app(state.clone());

        let path = format!("/tasks/{task_id}");
        let response = make_request(
            Some(&state),
            app,
            Method::PUT,
            &path,
            json!({
                "status": "Completed",
                "dueDate": "31-02-2024 99:00:00",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Whole update was rejected.
        let task = state.tasks().get_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, task::Status::NotStarted);
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let state = router::state();
        let app = app(state.clone());

        let response = make_request(
            Some(&state),
            app,
            Method::PUT,
            "/tasks/7",
            json!({ "status": "Completed" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_missing_task() {
        let state = router::state();
        let app = app(state.clone());

        let response = make_request(
            Some(&state),
            app,
            Method::DELETE,
            "/tasks/7",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
