//! Shopping-list collaboration API
//!
//! Users sign up, log in, create lists, share them by username and track
//! items through `todo -> bought`. Every authenticated call rotates the
//! caller's session token.

pub mod authz;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use routes::create_router;
pub use service::{Authenticated, ShoppingService};
pub use state::AppState;
