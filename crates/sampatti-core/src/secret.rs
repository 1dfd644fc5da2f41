//! One-way secret hashing for passwords and emergency access codes

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tracing::warn;

use crate::error::{AccessError, Result};

/// Slow, salted one-way hash of a secret
pub trait SecretVerifier: Send + Sync + std::fmt::Debug {
    /// Hash `secret` into an opaque, self-describing string
    fn hash(&self, secret: &str) -> Result<String>;

    /// Check `secret` against a hash produced by [`SecretVerifier::hash`].
    /// A malformed hash never verifies.
    fn verify(&self, secret: &str, hash: &str) -> bool;
}

/// Argon2id verifier producing PHC strings
#[derive(Debug, Clone)]
pub struct Argon2Verifier {
    params: Params,
}

impl Argon2Verifier {
    /// Verifier with the crate's default Argon2 cost
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Verifier with explicit memory (KiB), iteration and lane counts
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AccessError::InvalidInput(format!("argon2 params: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretVerifier for Argon2Verifier {
    fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AccessError::Internal(format!("failed to hash secret: {}", e)))
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored secret hash is malformed");
                return false;
            }
        };
        // Parameters are read from the PHC string, so older hashes still verify
        self.argon2()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}
