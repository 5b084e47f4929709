//! Session middleware and cookie helpers

use std::time::Duration;

use auth::{SESSION_COOKIE, SessionStore, UserContext};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{error::ServiceError, repositories::Store, state::AppState};

/// Resolve the session cookie and expose the caller as a [`UserContext`]
/// request extension
pub async fn session_middleware<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let ctx: UserContext = state.service.authenticate(&jar).await?;
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Cookie carrying a freshly issued session token
pub fn session_cookie(token: String, ttl: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(ttl.as_secs() as i64));
    cookie
}

/// Cookie instructing the client to forget its session token
pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), Duration::from_secs(120));

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(120)));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let cookie = cleared_session_cookie();

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
