//! Storage collaborator for users and tasks.
//!
//! Every call is atomic; absent rows come back as `None`, never as an error.

mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::task::Task;
use crate::user::User;

/// Users persistence contract.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user, returning the storage-assigned id.
    async fn insert_user(&self, user: &User) -> Result<i64>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn list_users_with_tasks(&self) -> Result<Vec<(User, Vec<Task>)>>;

    async fn user_exists(&self, id: i64) -> Result<bool>;
}

/// Tasks persistence contract.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a task, returning the storage-assigned id.
    async fn insert_task(&self, task: &Task) -> Result<i64>;

    async fn find_task_by_id(&self, id: i64) -> Result<Option<Task>>;

    async fn list_tasks_by_user(&self, user_id: i64) -> Result<Vec<Task>>;

    async fn update_task(&self, task: &Task) -> Result<()>;

    async fn delete_task(&self, id: i64) -> Result<()>;
}

/// Storage union structure to pass to Axum.
#[derive(Clone)]
pub struct Database {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl Database {
    /// Connect a PostgreSQL-backed storage.
    pub async fn postgres(config: &crate::config::Postgres) -> Result<Self> {
        let store = Arc::new(PgStore::connect(config).await?);

        Ok(Self {
            users: store.clone(),
            tasks: store,
        })
    }

    /// In-memory storage, for tests and secret-less local runs.
    pub fn memory() -> Self {
        let store = Arc::new(MemStore::new());

        Self {
            users: store.clone(),
            tasks: store,
        }
    }
}
