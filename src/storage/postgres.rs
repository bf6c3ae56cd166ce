//! PostgreSQL storage backend.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use super::{TaskStore, UserStore};
use crate::error::{Result, ServerError};
use crate::task::{Status, Task};
use crate::user::User;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "taska";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// PostgreSQL-backed storage over a connection pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect the pool and run pending migrations.
    pub async fn connect(config: &crate::config::Postgres) -> Result<Self> {
        let username =
            config.username.as_deref().unwrap_or(DEFAULT_CREDENTIALS);
        let password =
            config.password.as_deref().unwrap_or(DEFAULT_CREDENTIALS);
        let database =
            config.database.as_deref().unwrap_or(DEFAULT_DATABASE_NAME);

        let addr = format!(
            "postgres://{username}:{password}@{}/{database}",
            config.address
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.unwrap_or(DEFAULT_POOL_SIZE))
            .connect(&addr)
            .await?;

        sqlx::migrate!().run(&pool).await.map_err(|err| {
            ServerError::Internal {
                details: format!("migration failed: {err}"),
            }
        })?;

        tracing::info!(address = %config.address, %database, "postgres connected");

        Ok(Self { pool })
    }
}

/// Raw task row; the status label is parsed after fetch.
#[derive(FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    title: String,
    description: Option<String>,
    due_date: chrono::DateTime<chrono::Utc>,
    status: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = ServerError;

    fn try_from(row: TaskRow) -> Result<Task> {
        let status = Status::from_str(&row.status).map_err(|_| {
            ServerError::Internal {
                details: format!(
                    "corrupt status label '{}' on task {}",
                    row.status, row.id
                ),
            }
        })?;

        Ok(Task {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            status,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";
const TASK_COLUMNS: &str =
    "id, user_id, title, description, due_date, status";

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO users (name, email, password_hash, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users_with_tasks(&self) -> Result<Vec<(User, Vec<Task>)>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(Task::try_from(row)?);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let owned = tasks
                    .iter()
                    .filter(|task| task.user_id == user.id)
                    .cloned()
                    .collect();

                (user, owned)
            })
            .collect())
    }

    async fn user_exists(&self, id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: &Task) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO tasks (user_id, title, description, due_date, status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id"#,
        )
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_task_by_id(&self, id: i64) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn list_tasks_by_user(&self, user_id: i64) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn update_task(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"UPDATE tasks
                SET title = $1, description = $2, due_date = $3, status = $4
                WHERE id = $5"#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(task.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
