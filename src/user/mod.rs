mod service;

pub use service::*;

use serde::{Deserialize, Serialize};

/// User as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Login identifier, unique with exact-match comparison.
    pub email: String,
    /// Argon2id PHC string, never the plaintext.
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
