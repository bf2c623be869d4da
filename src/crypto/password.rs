use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroize;

use crate::error::{AppError, Result};

/// The default memory cost for Argon2 in MB.
pub const ARGON2_MEMORY_MB: u32 = 19;
/// The default number of iterations for Argon2.
pub const ARGON2_ITERATIONS: u32 = 3;
/// The default parallelism factor for Argon2.
pub const ARGON2_PARALLELISM: u32 = 6;

/// Argon2id password hashing with a tunable work factor.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Creates a hasher with the given Argon2 cost parameters.
    ///
    /// # Arguments
    ///
    /// * `memory_kib` - Memory cost in KiB.
    /// * `iterations` - Number of passes.
    /// * `parallelism` - Number of lanes.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = ParamsBuilder::new()
            .m_cost(memory_kib)
            .t_cost(iterations)
            .p_cost(parallelism)
            .build()
            .map_err(|e| AppError::Config(format!("Argon2 params: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a password using Argon2id and a random salt.
    ///
    /// # Returns
    ///
    /// A `Result` containing the PHC-encoded hash.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.is_empty() {
            return Err(AppError::validation("Password cannot be empty"));
        }

        let mut password_bytes = password.as_bytes().to_vec();

        let mut salt_bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| AppError::Internal(format!("Failed to generate salt: {}", e)))?;

        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AppError::Hashing(format!("Salt encoding error: {}", e)))?;

        let result = self
            .argon2()
            .hash_password(&password_bytes, &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Hashing(format!("Argon2 hash error: {}", e)));

        password_bytes.zeroize();
        salt_bytes.zeroize();
        tracing::debug!("Password hashed with Argon2id");
        result
    }

    /// Verifies a password against a stored hash.
    ///
    /// The cost parameters are read from the hash itself. A hash that cannot
    /// be parsed never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash could not be parsed: {}", e);
                return false;
            }
        };

        let mut password_bytes = password.as_bytes().to_vec();
        let matches = self
            .argon2()
            .verify_password(&password_bytes, &parsed_hash)
            .is_ok();

        password_bytes.zeroize();
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery", &hash));
        assert!(!hasher.verify("correct horse battery!", &hash));
    }

    #[test]
    fn salts_are_random() {
        let hasher = hasher();
        let a = hasher.hash("password123").unwrap();
        let b = hasher.hash("password123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_password_is_rejected() {
        let err = hasher().hash("").unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn malformed_hash_never_matches() {
        let hasher = hasher();
        assert!(!hasher.verify("password123", "not-a-hash"));
        assert!(!hasher.verify("password123", ""));
        assert!(!hasher.verify("password123", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn verify_uses_parameters_from_the_hash() {
        let weak = hasher();
        let hash = weak.hash("password123").unwrap();
        let other = PasswordHasher::new(2048, 2, 1).unwrap();
        assert!(other.verify("password123", &hash));
    }
}
