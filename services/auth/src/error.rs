//! Error types for credential hashing and sessions

use common::error::CacheError;
use thiserror::Error;

/// Failures of the session layer
#[derive(Error, Debug)]
pub enum SessionError {
    /// No token was presented, or the token is unknown or expired
    #[error("Unauthenticated")]
    Unauthenticated,

    /// A new session could not be written to the cache
    #[error("Failed to store session: {0}")]
    CacheWrite(#[source] CacheError),

    /// The cache could not be read while resolving a token
    #[error("Failed to read session: {0}")]
    CacheRead(#[source] CacheError),

    /// A session could not be removed from the cache
    #[error("Failed to delete session: {0}")]
    CacheDelete(#[source] CacheError),
}

/// Failures of the password hasher
#[derive(Error, Debug)]
pub enum HashError {
    /// The configured argon2 parameters are invalid
    #[error("Invalid password hashing parameters: {0}")]
    Params(String),

    /// The stored digest is not a PHC string
    #[error("Malformed password digest: {0}")]
    MalformedDigest(String),

    /// Hashing or verification failed for a reason other than a mismatch
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// A rejected input field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
