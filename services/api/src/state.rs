//! Application state shared across handlers

use std::time::Duration;

use auth::SessionStore;

use crate::repositories::Store;
use crate::service::ShoppingService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S, C> {
    pub service: ShoppingService<S, C>,
}

impl<S: Store, C: SessionStore> AppState<S, C> {
    pub fn new(service: ShoppingService<S, C>) -> Self {
        Self { service }
    }

    pub fn session_ttl(&self) -> Duration {
        self.service.sessions().ttl()
    }
}
