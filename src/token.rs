//! Manage json web tokens.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_AUDIENCE: &str = "taska";
pub const EXPIRATION_TIME: u64 = 60 * 60; // 1 hour, in seconds.

/// Authentication failures surfaced to callers.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Login rejected. Unknown email and wrong password both map here.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Token rejected: bad signature, issuer, audience or lifetime.
    #[error("token is invalid")]
    Invalid,
}

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Recipients that the JWT is intended for.
    pub aud: String,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// Unique token id.
    pub jti: String,
    /// User ID.
    pub sub: String,
    /// Email the user logged in with.
    pub email: String,
}

/// Manage JWT tokens, signed with a server-held symmetric secret.
///
/// Tokens are self-contained: validation is purely cryptographic, nothing is
/// looked up server-side, and there is no revocation.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(issuer: &str, secret: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.to_owned(),
            audience: DEFAULT_AUDIENCE.to_owned(),
        }
    }

    /// Set `audience` field on JWT.
    pub fn audience(&mut self, audience: &str) {
        self.audience = audience.to_owned();
    }

    /// Create a new token for a user, valid for [`EXPIRATION_TIME`] seconds.
    pub fn create(
        &self,
        user_id: i64,
        email: &str,
    ) -> crate::error::Result<String> {
        let now = Utc::now().timestamp() as u64;

        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        let claims = Claims {
            aud: self.audience.clone(),
            exp: now + EXPIRATION_TIME,
            iat: now,
            iss: self.issuer.clone(),
            jti: hex::encode(bytes),
            sub: user_id.to_string(),
            email: email.to_owned(),
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Decode and check a token.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::Invalid)
    }
}
