//! Session store backends
//!
//! A session store maps opaque tokens to user ids for a fixed time to live.
//! Production uses Redis; the in-memory store serves local runs and tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use common::cache::RedisPool;
use common::error::{CacheError, CacheResult};
use tokio::time::Instant;

/// Key-value cache holding `token -> user_id` with a TTL
///
/// Implementations must be safe to share between concurrent requests and
/// must make a `put` visible to a following `fetch` from the same process.
pub trait SessionStore: Clone + Send + Sync + 'static {
    /// Bind `token` to `user_id` for `ttl`, replacing any previous binding
    fn put(
        &self,
        token: &str,
        user_id: i64,
        ttl: Duration,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Resolve a live token
    fn fetch(&self, token: &str) -> impl Future<Output = CacheResult<Option<i64>>> + Send;

    /// Drop a token; absent tokens are not an error
    fn remove(&self, token: &str) -> impl Future<Output = CacheResult<()>> + Send;

    /// Whether the backing cache answers
    fn health_check(&self) -> impl Future<Output = CacheResult<bool>> + Send {
        async { Ok(true) }
    }
}

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
}

impl RedisSessionStore {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }
}

impl SessionStore for RedisSessionStore {
    async fn put(&self, token: &str, user_id: i64, ttl: Duration) -> CacheResult<()> {
        // SET EX rejects a zero expiry
        let ttl_seconds = ttl.as_secs().max(1);
        self.redis_pool
            .set(&session_key(token), &user_id.to_string(), Some(ttl_seconds))
            .await
    }

    async fn fetch(&self, token: &str) -> CacheResult<Option<i64>> {
        match self.redis_pool.get(&session_key(token)).await? {
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
                CacheError::UnexpectedReply(format!("session value {:?} is not a user id", raw))
            }),
            None => Ok(None),
        }
    }

    async fn remove(&self, token: &str) -> CacheResult<()> {
        self.redis_pool.delete(&session_key(token)).await?;
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        self.redis_pool.health_check().await
    }
}

#[derive(Debug)]
struct Entry {
    user_id: i64,
    expires_at: Instant,
}

/// Process-local session store with lazy expiry
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    async fn put(&self, token: &str, user_id: i64, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            token.to_string(),
            Entry {
                user_id,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn fetch(&self, token: &str) -> CacheResult<Option<i64>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(token) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.user_id)),
            Some(_) => {
                entries.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, token: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(token);
        Ok(())
    }
}
