//! Signup, login and logout

use auth::{SessionStore, UserContext, validation};
use chrono::Utc;
use tracing::{info, warn};

use super::{Authenticated, ShoppingService};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{LoginRequest, NewUser, SignupRequest, User, UserRef, UserStatus};
use crate::repositories::{Store, StoreError, StoreTx};

impl<S: Store, C: SessionStore> ShoppingService<S, C> {
    /// Register a new account
    ///
    /// The username check runs before hashing so that taken names cost no
    /// hashing work; the unique constraint still settles concurrent signups.
    pub async fn signup(&self, request: SignupRequest) -> ServiceResult<User> {
        let SignupRequest {
            username,
            password,
            full_name,
            email,
        } = request;
        validation::validate_signup(&username, &password, &email)?;

        self.bounded(async move {
            {
                let mut tx = self.store.begin().await?;
                if tx.find_user_by_username(&username).await?.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "username {} is already taken",
                        username
                    )));
                }
            }

            let password_hash = self.hash_password(password).await?;

            let mut tx = self.store.begin().await?;
            let new_user = NewUser {
                username,
                password_hash,
                full_name,
                email,
            };
            let user = match tx.insert_user(&new_user, Utc::now()).await {
                Ok(user) => user,
                Err(StoreError::UniqueViolation(_)) => {
                    return Err(ServiceError::Conflict(format!(
                        "username {} is already taken",
                        new_user.username
                    )));
                }
                Err(e) => return Err(e.into()),
            };
            tx.commit().await?;

            info!("User signed up: {}", user.id);
            Ok(user)
        })
        .await
    }

    /// Verify credentials and open a session
    ///
    /// The password is checked before any transaction opens; only the login
    /// timestamp and the new session share one.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<Authenticated<UserRef>> {
        let LoginRequest { username, password } = request;
        validation::require_text("username", &username)?;
        validation::require_text("password", &password)?;

        self.bounded(async move {
            let user = {
                let mut tx = self.store.begin().await?;
                tx.find_user_by_username(&username).await?
            };
            let Some(user) = user else {
                warn!("Login rejected: unknown username");
                return Err(ServiceError::Unauthorized);
            };

            if user.status != UserStatus::Active {
                warn!("Login rejected: user {} is disabled", user.id);
                return Err(ServiceError::Unauthorized);
            }

            if !self
                .verify_password(user.password_hash.clone(), password)
                .await?
            {
                warn!("Login rejected: wrong password for user {}", user.id);
                return Err(ServiceError::Unauthorized);
            }

            let mut tx = self.store.begin().await?;
            tx.record_login(user.id, Utc::now()).await?;
            let session_token = self.sessions.issue(user.id).await?;
            if let Err(e) = tx.commit().await {
                if let Err(revoke) = self.sessions.revoke(&session_token).await {
                    warn!("Failed to revoke session after aborted login: {}", revoke);
                }
                return Err(e.into());
            }

            info!("User logged in: {}", user.id);
            Ok(Authenticated {
                value: user.user_ref(),
                session_token,
            })
        })
        .await
    }

    /// End the caller's session; ending an already ended session succeeds
    pub async fn logout(&self, ctx: &UserContext) -> ServiceResult<()> {
        self.bounded(async move {
            self.sessions.revoke(&ctx.session_token).await?;
            info!("User logged out: {}", ctx.user_id);
            Ok(())
        })
        .await
    }
}
