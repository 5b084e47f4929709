//! Custom error types for the common library
//!
//! This module defines the infrastructure error types shared by the
//! services: relational database failures and cache failures.

use redis::RedisError;
use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(#[from] MigrateError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Custom error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache could not be reached
    #[error("Cache connection error: {0}")]
    Connection(#[source] RedisError),

    /// A cache command failed
    #[error("Cache command error: {0}")]
    Command(#[source] RedisError),

    /// The cache answered with something we could not interpret
    #[error("Unexpected cache reply: {0}")]
    UnexpectedReply(String),
}

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
