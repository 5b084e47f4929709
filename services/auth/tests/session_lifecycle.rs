//! Session lifecycle tests: issue, resolve, rotate, revoke and expire.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use auth::{
    DEFAULT_REFRESH_TIMEOUT, DEFAULT_SESSION_TTL, MemorySessionStore, SessionError,
    SessionManager, SessionStore, UserContext,
};
use common::error::{CacheError, CacheResult};
use tokio_test::{assert_err, assert_ok};

fn manager() -> SessionManager<MemorySessionStore> {
    SessionManager::new(MemorySessionStore::new(), DEFAULT_SESSION_TTL)
}

/// Memory store whose writes can be switched off, slowed down or failed
/// one delete at a time
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemorySessionStore,
    writes_down: Arc<AtomicBool>,
    writes_stalled: Arc<AtomicBool>,
    failing_removes: Arc<AtomicUsize>,
}

impl FlakyStore {
    fn fail_writes(&self, down: bool) {
        self.writes_down.store(down, Ordering::SeqCst);
    }

    fn stall_writes(&self, stalled: bool) {
        self.writes_stalled.store(stalled, Ordering::SeqCst);
    }

    fn fail_next_removes(&self, count: usize) {
        self.failing_removes.store(count, Ordering::SeqCst);
    }

    fn outage(&self) -> CacheResult<()> {
        if self.writes_down.load(Ordering::SeqCst) {
            return Err(CacheError::UnexpectedReply("connection refused".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for FlakyStore {
    async fn put(&self, token: &str, user_id: i64, ttl: Duration) -> CacheResult<()> {
        self.outage()?;
        if self.writes_stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.put(token, user_id, ttl).await
    }

    async fn fetch(&self, token: &str) -> CacheResult<Option<i64>> {
        self.inner.fetch(token).await
    }

    async fn remove(&self, token: &str) -> CacheResult<()> {
        self.outage()?;
        let failed = self
            .failing_removes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(CacheError::UnexpectedReply("delete timed out".to_string()));
        }
        self.inner.remove(token).await
    }
}

#[tokio::test(start_paused = true)]
async fn session_round_trip_within_ttl_then_expires() {
    let sessions = manager();
    let token = sessions.issue(11).await.unwrap();

    tokio::time::advance(Duration::from_secs(100)).await;
    let ctx = sessions.extract(token.as_str()).await.unwrap();
    assert_eq!(ctx.user_id, 11);

    tokio::time::advance(Duration::from_secs(21)).await;
    assert!(matches!(
        sessions.extract(token.as_str()).await,
        Err(SessionError::Unauthenticated)
    ));
}

#[tokio::test(start_paused = true)]
async fn refresh_restarts_the_countdown() {
    let sessions = manager();
    let first = sessions.issue(5).await.unwrap();

    tokio::time::advance(Duration::from_secs(100)).await;
    let ctx = sessions.extract(first.as_str()).await.unwrap();
    let second = sessions.refresh(&ctx).await.unwrap();

    tokio::time::advance(Duration::from_secs(100)).await;
    let ctx = sessions.extract(second.as_str()).await.unwrap();
    assert_eq!(ctx.user_id, 5);
}

#[tokio::test]
async fn rotation_invalidates_the_old_token() {
    let sessions = manager();
    let old = sessions.issue(9).await.unwrap();
    let ctx = sessions.extract(old.as_str()).await.unwrap();

    let new = sessions.refresh(&ctx).await.unwrap();

    assert_ne!(old, new);
    assert!(matches!(
        sessions.extract(old.as_str()).await,
        Err(SessionError::Unauthenticated)
    ));
    assert_eq!(sessions.extract(new.as_str()).await.unwrap().user_id, 9);
    assert_eq!(sessions.store().len(), 1);
}

#[tokio::test]
async fn revoke_is_idempotent() {
    let sessions = manager();
    let token = sessions.issue(3).await.unwrap();

    assert_ok!(sessions.revoke(&token).await);
    assert_ok!(sessions.revoke(&token).await);
    assert_err!(sessions.extract(token.as_str()).await);
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    let sessions = manager();
    let carrier: Option<String> = None;

    assert!(matches!(
        sessions.extract(&carrier).await,
        Err(SessionError::Unauthenticated)
    ));
}

#[tokio::test]
async fn unknown_token_is_unauthenticated() {
    let sessions = manager();

    assert!(matches!(
        sessions.extract("never-issued").await,
        Err(SessionError::Unauthenticated)
    ));
}

#[tokio::test]
async fn issue_reports_cache_write_failures() {
    let store = FlakyStore::default();
    store.fail_writes(true);
    let sessions = SessionManager::new(store, DEFAULT_SESSION_TTL);

    assert!(matches!(
        sessions.issue(1).await,
        Err(SessionError::CacheWrite(_))
    ));
}

#[tokio::test]
async fn failed_refresh_keeps_the_presented_token() {
    let store = FlakyStore::default();
    let sessions = SessionManager::new(store.clone(), DEFAULT_SESSION_TTL);
    let token = sessions.issue(4).await.unwrap();
    let ctx = UserContext {
        user_id: 4,
        session_token: token.clone(),
    };

    store.fail_writes(true);
    assert_err!(sessions.refresh(&ctx).await);
    assert_eq!(sessions.refresh_or_keep(&ctx).await, token);

    store.fail_writes(false);
    assert_eq!(sessions.extract(token.as_str()).await.unwrap().user_id, 4);
}

#[tokio::test]
async fn failed_delete_of_the_old_token_withdraws_the_new_one() {
    let store = FlakyStore::default();
    let sessions = SessionManager::new(store.clone(), DEFAULT_SESSION_TTL);
    let token = sessions.issue(6).await.unwrap();
    let ctx = sessions.extract(token.as_str()).await.unwrap();

    store.fail_next_removes(1);
    assert!(matches!(
        sessions.refresh(&ctx).await,
        Err(SessionError::CacheDelete(_))
    ));

    assert_eq!(store.inner.len(), 1);
    assert_eq!(sessions.extract(token.as_str()).await.unwrap().user_id, 6);
}

#[tokio::test(start_paused = true)]
async fn slow_refresh_gives_up_and_keeps_the_presented_token() {
    let store = FlakyStore::default();
    let sessions = SessionManager::new(store.clone(), DEFAULT_SESSION_TTL)
        .with_refresh_timeout(Duration::from_millis(500));
    let token = sessions.issue(8).await.unwrap();
    let ctx = sessions.extract(token.as_str()).await.unwrap();

    store.stall_writes(true);
    let started = tokio::time::Instant::now();
    assert_eq!(sessions.refresh_or_keep(&ctx).await, token);
    assert!(started.elapsed() < DEFAULT_REFRESH_TIMEOUT);

    assert_eq!(sessions.extract(token.as_str()).await.unwrap().user_id, 8);
}

#[tokio::test]
async fn concurrent_issues_produce_distinct_live_tokens() {
    let sessions = manager();

    let handles: Vec<_> = (0..32)
        .map(|user_id| {
            let sessions = sessions.clone();
            tokio::spawn(async move { (user_id, sessions.issue(user_id).await.unwrap()) })
        })
        .collect();

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    for (user_id, token) in &tokens {
        assert_eq!(
            sessions.extract(token.as_str()).await.unwrap().user_id,
            *user_id
        );
    }
    assert_eq!(sessions.store().len(), 32);
}
