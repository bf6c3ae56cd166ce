//! Task orchestration: creation, retrieval, update, deletion.

use std::str::FromStr;

use thiserror::Error;

use crate::error::Result;
use crate::storage::Database;
use crate::task::validator::{self, TaskUpdate, ValidationError};
use crate::task::{Status, Task};

/// Rejections for task lifecycle operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Owner id does not reference an existing user.
    #[error("invalid user id")]
    UnknownOwner,
    #[error("task not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Task manager, orchestrating validation and storage.
#[derive(Clone)]
pub struct TaskService {
    db: Database,
}

impl TaskService {
    /// Create a new [`TaskService`].
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a task for an existing owner.
    ///
    /// The owner check and the insert are two storage calls. A user deleted
    /// in between is an accepted race.
    pub async fn create(
        &self,
        owner_id: i64,
        title: &str,
        description: Option<String>,
        status: &str,
        due_date: &str,
    ) -> Result<i64> {
        if !self.db.users.user_exists(owner_id).await? {
            return Err(TaskError::UnknownOwner.into());
        }

        let status = Status::from_str(status).map_err(TaskError::from)?;
        let due_date =
            validator::parse_due_date(due_date).map_err(TaskError::from)?;

        let task = Task {
            id: 0,
            user_id: owner_id,
            title: title.to_owned(),
            description,
            due_date,
            status,
        };

        self.db.tasks.insert_task(&task).await
    }

    /// List every task owned by a user.
    ///
    /// An empty result is a not-found at this boundary, even for a known
    /// user with zero tasks.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Task>> {
        let tasks = self.db.tasks.list_tasks_by_user(user_id).await?;
        if tasks.is_empty() {
            return Err(TaskError::NotFound.into());
        }

        Ok(tasks)
    }

    /// Simple existence lookup, also used by update and delete.
    pub async fn get_by_id(&self, task_id: i64) -> Result<Option<Task>> {
        self.db.tasks.find_task_by_id(task_id).await
    }

    /// Apply a partial update: validate every supplied field, then persist.
    ///
    /// Nothing is written when any supplied field fails validation.
    pub async fn update(&self, task_id: i64, update: &TaskUpdate) -> Result<()> {
        let Some(mut task) = self.get_by_id(task_id).await? else {
            return Err(TaskError::NotFound.into());
        };

        validator::apply_update(&mut task, update).map_err(TaskError::from)?;

        self.db.tasks.update_task(&task).await
    }

    /// Delete a task by id.
    pub async fn delete(&self, task_id: i64) -> Result<()> {
        if self.get_by_id(task_id).await?.is_none() {
            return Err(TaskError::NotFound.into());
        }

        self.db.tasks.delete_task(task_id).await
    }
}
