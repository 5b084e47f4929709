//! API models for stored entities and request/response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod category;
pub mod item;
pub mod list;
pub mod user;

pub use category::{Category, CategoryInput, NewCategory};
pub use item::{
    BuyItemRequest, CreateItemRequest, CreatedItem, Item, ItemRow, ItemStatus, ItemView, NewItem,
};
pub use list::{
    AccessLevel, AccessType, ContributedList, Contributor, CreateListRequest, ListStatus,
    ListSummary, NewList, ShareListRequest, ShoppingList,
};
pub use user::{LoginRequest, NewUser, SignupRequest, User, UserStatus};

/// Minimal public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
}

/// Query string of `GET /item`
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub list_id: i64,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserRef,
    pub expires_in: u64,
}

/// Response for the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub cache: bool,
    pub checked_at: DateTime<Utc>,
}
