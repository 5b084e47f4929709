//! Repositories for relational storage
//!
//! Every protocol runs against one [`StoreTx`]. Writes become visible only on
//! [`StoreTx::commit`]; dropping a transaction without committing rolls it
//! back, which covers early returns, panics and cancelled requests alike.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Category, ContributedList, Contributor, Item, ItemRow, ItemStatus, ListStatus,
    NewCategory, NewItem, NewList, NewUser, ShoppingList, User,
};

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

/// Storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row does not exist
    #[error("Foreign key violated: {0}")]
    MissingReference(String),

    /// Failure forced through a [`FailPoint`]
    #[error("Injected failure at {0:?}")]
    Injected(FailPoint),
}

/// Type alias for repository results
pub type StoreResult<T> = Result<T, StoreError>;

/// Relational store handing out transactions
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: StoreTx;

    /// Open a transaction
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send;

    /// Whether the store answers
    fn health_check(&self) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// One open transaction
///
/// The `lock_*` reads hold the row until commit or rollback so that state
/// checks and the writes depending on them cannot interleave with another
/// writer.
pub trait StoreTx: Send {
    fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// Insert an `active` user; a taken username yields `UniqueViolation`
    fn insert_user(
        &mut self,
        user: &NewUser,
        now: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<User>> + Send;

    fn record_login(
        &mut self,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Insert a `todo` list
    fn insert_list(
        &mut self,
        list: &NewList,
        now: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<ShoppingList>> + Send;

    fn find_list(
        &mut self,
        list_id: i64,
    ) -> impl Future<Output = StoreResult<Option<ShoppingList>>> + Send;

    /// Read a list and hold its row until the transaction ends
    fn lock_list(
        &mut self,
        list_id: i64,
    ) -> impl Future<Output = StoreResult<Option<ShoppingList>>> + Send;

    fn set_list_status(
        &mut self,
        list_id: i64,
        status: ListStatus,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Non-deleted lists `user_id` contributes to, ordered by list id
    fn lists_for_user(
        &mut self,
        user_id: i64,
    ) -> impl Future<Output = StoreResult<Vec<ContributedList>>> + Send;

    fn find_contributor(
        &mut self,
        list_id: i64,
        user_id: i64,
    ) -> impl Future<Output = StoreResult<Option<Contributor>>> + Send;

    /// Insert a contributor row or overwrite the access of an existing one
    fn upsert_contributor(
        &mut self,
        contributor: &Contributor,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn find_category(
        &mut self,
        category_id: i64,
    ) -> impl Future<Output = StoreResult<Option<Category>>> + Send;

    fn find_category_by_name(
        &mut self,
        name: &str,
        kind: &str,
    ) -> impl Future<Output = StoreResult<Option<Category>>> + Send;

    fn insert_category(
        &mut self,
        category: &NewCategory,
    ) -> impl Future<Output = StoreResult<Category>> + Send;

    /// Every category, ordered by id
    fn all_categories(&mut self) -> impl Future<Output = StoreResult<Vec<Category>>> + Send;

    /// Insert a `todo` item created and last modified by `created_by`
    fn insert_item(
        &mut self,
        item: &NewItem,
        now: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Item>> + Send;

    /// Read an item and hold its row until the transaction ends
    fn lock_item(
        &mut self,
        item_id: i64,
    ) -> impl Future<Output = StoreResult<Option<Item>>> + Send;

    /// Move an item to `bought`
    fn mark_item_bought(
        &mut self,
        item_id: i64,
        buyer_id: i64,
        modified_by: i64,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Item>> + Send;

    fn set_item_status(
        &mut self,
        item_id: i64,
        status: ItemStatus,
        modified_by: i64,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Non-deleted items of a list with their category and usernames
    fn items_for_list(
        &mut self,
        list_id: i64,
    ) -> impl Future<Output = StoreResult<Vec<ItemRow>>> + Send;

    /// Make every write of this transaction visible
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;
}

