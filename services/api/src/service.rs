//! Shopping-list protocols and queries
//!
//! Each public method runs one protocol in its own transaction. Methods that
//! act for an authenticated caller take the caller's [`UserContext`] and,
//! on success, hand back a rotated session token next to the result.
//!
//! The request deadline covers the transactional part only. The token
//! rotation that follows a commit is bounded by the session manager and
//! never fails the call.

use std::future::Future;
use std::time::Duration;

use auth::{CredentialCarrier, PasswordHasher, SessionManager, SessionStore, UserContext};
use tracing::{error, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::repositories::Store;

mod account;
mod categories;
mod items;
mod lists;

/// Default bound on the transactional part of one call
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Result of an authenticated operation plus the token the caller must use next
#[derive(Debug)]
pub struct Authenticated<T> {
    pub value: T,
    pub session_token: String,
}

/// Entry point for every protocol
#[derive(Clone)]
pub struct ShoppingService<S, C> {
    store: S,
    sessions: SessionManager<C>,
    hasher: PasswordHasher,
    share_validity: chrono::Duration,
    deadline: Duration,
}

impl<S: Store, C: SessionStore> ShoppingService<S, C> {
    /// Create a new service
    pub fn new(
        store: S,
        sessions: SessionManager<C>,
        hasher: PasswordHasher,
        share_validity: Duration,
    ) -> Self {
        let share_validity = chrono::Duration::from_std(share_validity)
            .unwrap_or_else(|_| chrono::Duration::days(365));

        Self {
            store,
            sessions,
            hasher,
            share_validity,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Bound the transactional part of every call
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sessions(&self) -> &SessionManager<C> {
        &self.sessions
    }

    /// Resolve the caller behind a credential carrier
    pub async fn authenticate<R>(&self, carrier: &R) -> ServiceResult<UserContext>
    where
        R: CredentialCarrier + Sync + ?Sized,
    {
        Ok(self.sessions.extract(carrier).await?)
    }

    /// Health of the relational store and the session cache
    pub async fn health(&self) -> (bool, bool) {
        let database = self.store.health_check().await.unwrap_or_else(|e| {
            error!("Database health check failed: {}", e);
            false
        });
        let cache = self.sessions.store().health_check().await.unwrap_or_else(|e| {
            error!("Cache health check failed: {}", e);
            false
        });
        (database, cache)
    }

    /// Run the transactional part of a call under the deadline
    ///
    /// An elapsed deadline drops `operation`, which rolls back any
    /// transaction it had open.
    async fn bounded<T, F>(&self, operation: F) -> ServiceResult<T>
    where
        F: Future<Output = ServiceResult<T>>,
    {
        match tokio::time::timeout(self.deadline, operation).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Operation exceeded its {:?} deadline", self.deadline);
                Err(ServiceError::Internal("request deadline exceeded".to_string()))
            }
        }
    }

    /// Wrap a successful result with the caller's rotated token
    async fn finish<T>(&self, ctx: &UserContext, value: T) -> Authenticated<T> {
        let session_token = self.sessions.refresh_or_keep(ctx).await;
        Authenticated {
            value,
            session_token,
        }
    }

    async fn hash_password(&self, password: String) -> ServiceResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
            .map_err(ServiceError::from)
    }

    async fn verify_password(&self, digest: String, password: String) -> ServiceResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| ServiceError::Internal(format!("verification task failed: {}", e)))?
            .map_err(ServiceError::from)
    }
}
