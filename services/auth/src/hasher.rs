//! One-way password hashing backed by argon2id

use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version};

use crate::error::HashError;

/// Cost parameters for argon2id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Salted password hasher
///
/// Digests are PHC strings, so they carry their own salt and parameters and
/// stay verifiable after the configured costs change.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a hasher with the given cost parameters
    pub fn new(config: HashConfig) -> Result<Self, HashError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| HashError::Params(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `plaintext` with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let digest = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::Hash(e.to_string()))?;

        Ok(digest.to_string())
    }

    /// Check `plaintext` against a digest produced by [`PasswordHasher::hash`]
    ///
    /// A mismatch is `Ok(false)`; only unusable digests are errors.
    pub fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(digest).map_err(|e| HashError::MalformedDigest(e.to_string()))?;

        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Hash(e.to_string())),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}
