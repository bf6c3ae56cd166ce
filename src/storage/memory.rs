//! In-memory storage backend.
//!
//! Used when no PostgreSQL instance is configured, and by the test suite.
//! Uniqueness of emails is the caller's concern, as with the SQL schema the
//! check lives above the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{TaskStore, UserStore};
use crate::error::Result;
use crate::task::Task;
use crate::user::User;

/// Process-local storage over [`RwLock`]-guarded maps.
pub struct MemStore {
    users: RwLock<HashMap<i64, User>>,
    tasks: RwLock<HashMap<i64, Task>>,
    next_user_id: AtomicI64,
    next_task_id: AtomicI64,
}

impl MemStore {
    /// Create an empty [`MemStore`].
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            next_user_id: AtomicI64::new(1),
            next_task_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemStore {
    async fn insert_user(&self, user: &User) -> Result<i64> {
        let id = self.next_user_id.fetch_add(1, Ordering::Relaxed);
        let user = User {
            id,
            ..user.clone()
        };

        self.users.write().await.insert(id, user);
        Ok(id)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_users_with_tasks(&self) -> Result<Vec<(User, Vec<Task>)>> {
        let users = self.users.read().await;
        let tasks = self.tasks.read().await;

        let mut users: Vec<User> = users.values().cloned().collect();
        users.sort_by_key(|user| user.id);

        Ok(users
            .into_iter()
            .map(|user| {
                let mut owned: Vec<Task> = tasks
                    .values()
                    .filter(|task| task.user_id == user.id)
                    .cloned()
                    .collect();
                owned.sort_by_key(|task| task.id);

                (user, owned)
            })
            .collect())
    }

    async fn user_exists(&self, id: i64) -> Result<bool> {
        Ok(self.users.read().await.contains_key(&id))
    }
}

#[async_trait]
impl TaskStore for MemStore {
    async fn insert_task(&self, task: &Task) -> Result<i64> {
        let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let task = Task {
            id,
            ..task.clone()
        };

        self.tasks.write().await.insert(id, task);
        Ok(id)
    }

    async fn find_task_by_id(&self, id: i64) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list_tasks_by_user(&self, user_id: i64) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.id);

        Ok(tasks)
    }

    async fn update_task(&self, task: &Task) -> Result<()> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        self.tasks.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Status;
    use crate::task::validator::parse_due_date;

    fn user(name: &str, email: &str) -> User {
        User {
            id: 0,
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash: "phc".to_owned(),
            created_at: chrono::Utc::now(),
        }
    }

    fn task(user_id: i64, title: &str) -> Task {
        Task {
            id: 0,
            user_id,
            title: title.to_owned(),
            description: None,
            due_date: parse_due_date("25-12-2024 15:30:00").unwrap(),
            status: Status::NotStarted,
        }
    }

    #[tokio::test]
    async fn test_ids_are_assigned_sequentially() {
        let store = MemStore::new();

        let first = store.insert_user(&user("Ann", "ann@x.com")).await.unwrap();
        let second =
            store.insert_user(&user("Bob", "bob@x.com")).await.unwrap();
        assert_eq!((first, second), (1, 2));

        assert!(store.user_exists(first).await.unwrap());
        assert!(!store.user_exists(99).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_users_with_tasks_groups_by_owner() {
        let store = MemStore::new();

        let ann = store.insert_user(&user("Ann", "ann@x.com")).await.unwrap();
        let bob = store.insert_user(&user("Bob", "bob@x.com")).await.unwrap();
        store.insert_task(&task(ann, "Buy milk")).await.unwrap();
        store.insert_task(&task(ann, "Walk dog")).await.unwrap();

        let listed = store.list_users_with_tasks().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0.id, ann);
        assert_eq!(listed[0].1.len(), 2);
        assert_eq!(listed[1].0.id, bob);
        assert!(listed[1].1.is_empty());
    }

    #[tokio::test]
    async fn test_task_crud() {
        let store = MemStore::new();
        let ann = store.insert_user(&user("Ann", "ann@x.com")).await.unwrap();

        let id = store.insert_task(&task(ann, "Buy milk")).await.unwrap();
        let mut stored = store.find_task_by_id(id).await.unwrap().unwrap();

        stored.status = Status::Completed;
        store.update_task(&stored).await.unwrap();
        assert_eq!(
            store.find_task_by_id(id).await.unwrap().unwrap().status,
            Status::Completed
        );

        store.delete_task(id).await.unwrap();
        assert!(store.find_task_by_id(id).await.unwrap().is_none());
        assert!(store.list_tasks_by_user(ann).await.unwrap().is_empty());
    }
}
