//! HTTP routes.

pub mod create;
pub mod login;
pub mod tasks;
pub mod users;

#[cfg(test)]
pub(crate) fn state() -> crate::AppState {
    use std::sync::Arc;

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        db: crate::storage::Database::memory(),
        crypto: Arc::new(
            crate::crypto::PasswordManager::new(None)
                .expect("default argon2 parameters"),
        ),
        token: crate::token::TokenManager::new("taska-test", b"test-secret"),
    }
}
