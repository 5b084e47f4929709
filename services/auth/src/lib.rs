//! Authentication building blocks for the shopping-list API
//!
//! Password hashing, cache-backed sessions with sliding expiration and
//! signup input validation. Storage of users lives with the API service;
//! this crate only knows about user ids.

pub mod error;
pub mod hasher;
pub mod session;
pub mod store;
pub mod validation;

pub use error::{HashError, SessionError, ValidationError};
pub use hasher::{HashConfig, PasswordHasher};
pub use session::{
    CredentialCarrier, DEFAULT_REFRESH_TIMEOUT, DEFAULT_SESSION_TTL, SESSION_COOKIE, SessionManager,
    UserContext,
};
pub use store::{MemorySessionStore, RedisSessionStore, SessionStore};
