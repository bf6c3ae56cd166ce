//! Password credential hashing.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification. The PHC string carries its own salt and cost parameters, so
/// verification needs no side-channel state.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2 {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id with a freshly generated salt.
    ///
    /// A failure here is an internal primitive failure, not a user error.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC string.
    ///
    /// Any mismatch, including a malformed stored hash, is `false`.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> bool {
        let Ok(parsed) = PasswordHash::new(phc_hash) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_ref(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PasswordManager {
        PasswordManager::new(None).expect("default argon2 parameters")
    }

    #[test]
    fn test_hash_then_verify() {
        let pwd = manager();
        let phc = pwd.hash_password("secret1").unwrap();

        assert!(phc.starts_with("$argon2id$"));
        assert!(pwd.verify_password("secret1", &phc));
        assert!(!pwd.verify_password("secret2", &phc));
    }

    #[test]
    fn test_hashes_are_salted() {
        let pwd = manager();

        assert_ne!(
            pwd.hash_password("secret1").unwrap(),
            pwd.hash_password("secret1").unwrap(),
        );
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert!(!manager().verify_password("secret1", "not a phc string"));
    }
}
