//! Account orchestration: registration, login, user projections.

use std::sync::Arc;

use thiserror::Error;

use crate::crypto::PasswordManager;
use crate::error::Result;
use crate::storage::Database;
use crate::task::Task;
use crate::token::{AuthError, TokenManager};
use crate::user::User;

/// Rejections for account operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("user already registered with this email")]
    EmailTaken,
}

/// Account manager, orchestrating credentials, tokens and storage.
#[derive(Clone)]
pub struct AccountService {
    db: Database,
    crypto: Arc<PasswordManager>,
    token: TokenManager,
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(
        db: Database,
        crypto: Arc<PasswordManager>,
        token: TokenManager,
    ) -> Self {
        Self { db, crypto, token }
    }

    /// Register a new user, returning the assigned id.
    ///
    /// Email comparison is exact-match.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64> {
        if self.db.users.find_user_by_email(email).await?.is_some() {
            return Err(AccountError::EmailTaken.into());
        }

        let user = User {
            id: 0,
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash: self.crypto.hash_password(password)?,
            created_at: chrono::Utc::now(),
        };

        self.db.users.insert_user(&user).await
    }

    /// Authenticate a user and issue a session token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, String)> {
        let Some(user) = self.db.users.find_user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials.into());
        };

        if !self.crypto.verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.token.create(user.id, &user.email)?;

        Ok((user, token))
    }

    /// Read-only projection of every user with their tasks.
    pub async fn list_with_tasks(&self) -> Result<Vec<(User, Vec<Task>)>> {
        self.db.users.list_users_with_tasks().await
    }

    /// Single-user projection with tasks.
    pub async fn find_with_tasks(
        &self,
        user_id: i64,
    ) -> Result<Option<(User, Vec<Task>)>> {
        let Some(user) = self.db.users.find_user_by_id(user_id).await? else {
            return Ok(None);
        };
        let tasks = self.db.tasks.list_tasks_by_user(user_id).await?;

        Ok(Some((user, tasks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServerError;

    fn service() -> AccountService {
        AccountService::new(
            Database::memory(),
            Arc::new(PasswordManager::new(None).expect("argon2 parameters")),
            TokenManager::new("taska-test", b"test-secret"),
        )
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();

        let id = service
            .register("Ann", "ann@x.com", "secret1")
            .await
            .unwrap();

        let (user, token) = service.login("ann@x.com", "secret1").await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.name, "Ann");
        assert_ne!(user.password_hash, "secret1");

        let claims = service.token.decode(&token).unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "ann@x.com");
    }

    #[tokio::test]
    async fn test_register_twice_same_email() {
        let service = service();

        service
            .register("Ann", "ann@x.com", "secret1")
            .await
            .unwrap();
        let err = service
            .register("Another Ann", "ann@x.com", "secret2")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServerError::Account(AccountError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_email_comparison_is_exact() {
        let service = service();

        service
            .register("Ann", "ann@x.com", "secret1")
            .await
            .unwrap();

        // Different case registers as a distinct account.
        service
            .register("Ann", "Ann@x.com", "secret1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();

        service
            .register("Ann", "ann@x.com", "secret1")
            .await
            .unwrap();

        let wrong_password =
            service.login("ann@x.com", "wrong").await.unwrap_err();
        let unknown_email =
            service.login("bob@x.com", "secret1").await.unwrap_err();

        assert!(matches!(
            wrong_password,
            ServerError::Auth(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            unknown_email,
            ServerError::Auth(AuthError::InvalidCredentials)
        ));
        assert_eq!(
            wrong_password.to_string(),
            unknown_email.to_string(),
        );
    }

    #[tokio::test]
    async fn test_find_with_tasks_unknown_user() {
        let service = service();

        assert!(service.find_with_tasks(99).await.unwrap().is_none());
    }
}
