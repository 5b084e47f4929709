//! Shared fixtures for the API integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use api::models::{
    CategoryInput, CreateItemRequest, CreateListRequest, LoginRequest, SignupRequest,
};
use api::repositories::MemoryStore;
use api::{Authenticated, ShoppingService};
use auth::{
    DEFAULT_SESSION_TTL, HashConfig, MemorySessionStore, PasswordHasher, SessionManager,
    SessionStore, UserContext,
};
use common::error::CacheResult;

pub type TestService = ShoppingService<MemoryStore, MemorySessionStore>;

pub const PASSWORD: &str = "correct-horse";

/// Argon2 parameters cheap enough for tests
pub fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(HashConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

pub fn service_with(store: MemoryStore) -> TestService {
    service_with_sessions(store, MemorySessionStore::new())
}

pub fn service_with_sessions<C: SessionStore>(
    store: MemoryStore,
    sessions: C,
) -> ShoppingService<MemoryStore, C> {
    ShoppingService::new(
        store,
        SessionManager::new(sessions, DEFAULT_SESSION_TTL),
        cheap_hasher(),
        Duration::from_secs(365 * 24 * 60 * 60),
    )
}

/// Session store whose writes can be made to hang
#[derive(Clone, Default)]
pub struct StallingSessions {
    inner: MemorySessionStore,
    stalled: Arc<AtomicBool>,
}

impl StallingSessions {
    pub fn stall_writes(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }
}

impl SessionStore for StallingSessions {
    async fn put(&self, token: &str, user_id: i64, ttl: Duration) -> CacheResult<()> {
        if self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.put(token, user_id, ttl).await
    }

    async fn fetch(&self, token: &str) -> CacheResult<Option<i64>> {
        self.inner.fetch(token).await
    }

    async fn remove(&self, token: &str) -> CacheResult<()> {
        self.inner.remove(token).await
    }
}

pub fn service() -> TestService {
    service_with(MemoryStore::new())
}

/// A logged-in user that follows token rotation
pub struct Caller {
    pub user_id: i64,
    pub ctx: UserContext,
}

impl Caller {
    /// Take the result of a call and remember the rotated token
    pub fn accept<T>(&mut self, outcome: Authenticated<T>) -> T {
        self.ctx.session_token = outcome.session_token;
        outcome.value
    }
}

/// Sign up and log in `username`
pub async fn register<C: SessionStore>(
    service: &ShoppingService<MemoryStore, C>,
    username: &str,
) -> Caller {
    let user = service
        .signup(SignupRequest {
            username: username.to_string(),
            password: PASSWORD.to_string(),
            full_name: format!("{} tester", username),
            email: format!("{}@example.com", username),
        })
        .await
        .unwrap();

    let login = service
        .login(LoginRequest {
            username: username.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap();
    let ctx = service
        .authenticate(login.session_token.as_str())
        .await
        .unwrap();

    Caller {
        user_id: user.id,
        ctx,
    }
}

pub fn list_request(name: &str) -> CreateListRequest {
    CreateListRequest {
        name: name.to_string(),
        description: String::new(),
        deadline: None,
    }
}

pub fn item_request(list_id: i64, title: &str, category: &str) -> CreateItemRequest {
    CreateItemRequest {
        list_id,
        title: title.to_string(),
        description: String::new(),
        deadline: None,
        category: CategoryInput {
            id: None,
            name: category.to_string(),
            kind: "food".to_string(),
        },
    }
}
