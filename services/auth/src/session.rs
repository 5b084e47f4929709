//! Session management on top of a [`SessionStore`]
//!
//! Sessions slide: every successful authenticated call rotates the caller's
//! token, which restarts the TTL and retires the token that was presented.

use std::fmt;
use std::time::Duration;

use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::store::SessionStore;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_token";

/// Default session lifetime
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(120);

/// Default bound on the post-operation token rotation
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(2);

/// Anything a session token can be read from
pub trait CredentialCarrier {
    fn session_token(&self) -> Option<&str>;
}

impl CredentialCarrier for CookieJar {
    fn session_token(&self) -> Option<&str> {
        self.get(SESSION_COOKIE).map(|cookie| cookie.value())
    }
}

impl CredentialCarrier for Option<String> {
    fn session_token(&self) -> Option<&str> {
        self.as_deref()
    }
}

impl CredentialCarrier for str {
    fn session_token(&self) -> Option<&str> {
        Some(self)
    }
}

/// The authenticated caller of one request
#[derive(Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: i64,
    pub session_token: String,
}

impl fmt::Debug for UserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserContext")
            .field("user_id", &self.user_id)
            .field("session_token", &"<redacted>")
            .finish()
    }
}

/// Session manager for issuing, resolving and rotating session tokens
#[derive(Clone)]
pub struct SessionManager<C> {
    store: C,
    ttl: Duration,
    refresh_timeout: Duration,
}

impl<C: SessionStore> SessionManager<C> {
    /// Create a new session manager
    pub fn new(store: C, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }

    /// Bound how long [`SessionManager::refresh_or_keep`] waits on the cache
    pub fn with_refresh_timeout(mut self, refresh_timeout: Duration) -> Self {
        self.refresh_timeout = refresh_timeout;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// Create a new session for a user and return its token
    pub async fn issue(&self, user_id: i64) -> Result<String, SessionError> {
        let token = Uuid::new_v4().to_string();
        self.store
            .put(&token, user_id, self.ttl)
            .await
            .map_err(SessionError::CacheWrite)?;

        debug!("Issued session for user: {}", user_id);
        Ok(token)
    }

    /// Resolve the caller behind the token presented in `carrier`
    pub async fn extract<R>(&self, carrier: &R) -> Result<UserContext, SessionError>
    where
        R: CredentialCarrier + ?Sized,
    {
        let token = carrier
            .session_token()
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::Unauthenticated)?;

        match self.store.fetch(token).await {
            Ok(Some(user_id)) => Ok(UserContext {
                user_id,
                session_token: token.to_string(),
            }),
            Ok(None) => Err(SessionError::Unauthenticated),
            Err(e) => Err(SessionError::CacheRead(e)),
        }
    }

    /// Replace the caller's token with a fresh one
    ///
    /// The new token is written before the old one is deleted, so a failure
    /// never leaves the caller without a usable session. When the old token
    /// cannot be deleted the new one is withdrawn again and the presented
    /// token stays the only live one.
    pub async fn refresh(&self, ctx: &UserContext) -> Result<String, SessionError> {
        let token = self.issue(ctx.user_id).await?;
        if let Err(e) = self.store.remove(&ctx.session_token).await {
            if let Err(cleanup) = self.store.remove(&token).await {
                warn!(
                    user_id = ctx.user_id,
                    error = %cleanup,
                    "Failed to withdraw the replacement session"
                );
            }
            return Err(SessionError::CacheDelete(e));
        }

        Ok(token)
    }

    /// [`SessionManager::refresh`], falling back to the presented token
    ///
    /// Runs after an operation already succeeded, so a cache hiccup must not
    /// turn that success into a failure. A slow cache is given up on after
    /// the refresh timeout; a replacement written past that point expires
    /// with its TTL.
    pub async fn refresh_or_keep(&self, ctx: &UserContext) -> String {
        match tokio::time::timeout(self.refresh_timeout, self.refresh(ctx)).await {
            Ok(Ok(token)) => token,
            Ok(Err(e)) => {
                warn!(
                    user_id = ctx.user_id,
                    error = %e,
                    "Session refresh failed, keeping the presented token"
                );
                ctx.session_token.clone()
            }
            Err(_) => {
                warn!(
                    user_id = ctx.user_id,
                    "Session refresh timed out after {:?}, keeping the presented token",
                    self.refresh_timeout
                );
                ctx.session_token.clone()
            }
        }
    }

    /// Delete a session; revoking an unknown token succeeds
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        self.store
            .remove(token)
            .await
            .map_err(SessionError::CacheDelete)?;

        info!("Session revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use axum_extra::extract::cookie::Cookie;

    fn manager() -> SessionManager<MemorySessionStore> {
        SessionManager::new(MemorySessionStore::new(), DEFAULT_SESSION_TTL)
    }

    #[tokio::test]
    async fn test_extract_reads_the_session_cookie() {
        let sessions = manager();
        let token = sessions.issue(42).await.unwrap();
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.clone()));

        let ctx = sessions.extract(&jar).await.unwrap();
        assert_eq!(ctx.user_id, 42);
        assert_eq!(ctx.session_token, token);
    }

    #[tokio::test]
    async fn test_extract_without_cookie_is_unauthenticated() {
        let sessions = manager();
        let jar = CookieJar::new().add(Cookie::new("other", "value"));

        assert!(matches!(
            sessions.extract(&jar).await,
            Err(SessionError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_empty_token_is_unauthenticated() {
        let sessions = manager();

        assert!(matches!(
            sessions.extract("").await,
            Err(SessionError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_tokens_are_uuid_v4() {
        let token = manager().issue(1).await.unwrap();
        let parsed = Uuid::parse_str(&token).unwrap();

        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_debug_redacts_the_token() {
        let ctx = UserContext {
            user_id: 3,
            session_token: "super-secret".to_string(),
        };

        let rendered = format!("{:?}", ctx);
        assert!(rendered.contains("user_id: 3"));
        assert!(!rendered.contains("super-secret"));
    }
}
