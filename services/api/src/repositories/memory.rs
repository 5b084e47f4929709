//! In-memory repository backend
//!
//! Transactions take the table lock for their whole lifetime and work on a
//! private copy of the tables, which replaces the shared copy on commit.
//! Writers are therefore serialised and a dropped transaction leaves no
//! trace. Constraints mirror the PostgreSQL schema.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::models::{
    Category, ContributedList, Contributor, Item, ItemRow, ItemStatus, ListStatus, NewCategory,
    NewItem, NewList, NewUser, ShoppingList, User, UserStatus,
};

/// Writes that can be forced to fail once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    InsertUser,
    InsertList,
    UpsertContributor,
    InsertCategory,
    InsertItem,
    MarkItemBought,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    lists: BTreeMap<i64, ShoppingList>,
    contributors: BTreeMap<(i64, i64), Contributor>,
    categories: BTreeMap<i64, Category>,
    items: BTreeMap<i64, Item>,
    next_user_id: i64,
    next_list_id: i64,
    next_category_id: i64,
    next_item_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn username(&self, user_id: i64) -> Option<&str> {
        self.users.get(&user_id).map(|u| u.username.as_str())
    }
}

/// Process-local store with PostgreSQL-like transactional semantics
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<tokio::sync::Mutex<Tables>>,
    fail_points: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write at `point` fail with [`StoreError::Injected`]
    pub fn fail_next(&self, point: FailPoint) {
        self.fail_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point);
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();

        Ok(MemoryTx {
            guard,
            working,
            fail_points: self.fail_points.clone(),
        })
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

/// Open in-memory transaction
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fail_points: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryTx {
    fn trip(&self, point: FailPoint) -> StoreResult<()> {
        let mut armed = self
            .fail_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if armed.remove(&point) {
            return Err(StoreError::Injected(point));
        }
        Ok(())
    }

    fn require_user(&self, user_id: i64, what: &str) -> StoreResult<()> {
        if self.working.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(format!("{} {}", what, user_id)))
        }
    }

    fn require_list(&self, list_id: i64) -> StoreResult<()> {
        if self.working.lists.contains_key(&list_id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(format!("list {}", list_id)))
        }
    }
}

impl StoreTx for MemoryTx {
    async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&mut self, user: &NewUser, now: DateTime<Utc>) -> StoreResult<User> {
        self.trip(FailPoint::InsertUser)?;
        if self
            .working
            .users
            .values()
            .any(|u| u.username == user.username)
        {
            return Err(StoreError::UniqueViolation(format!(
                "username {}",
                user.username
            )));
        }

        let user = User {
            id: next_id(&mut self.working.next_user_id),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            last_logged_in_at: None,
        };
        self.working.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(&mut self, user_id: i64, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(user) = self.working.users.get_mut(&user_id) {
            user.last_logged_in_at = Some(at);
        }
        Ok(())
    }

    async fn insert_list(&mut self, list: &NewList, now: DateTime<Utc>) -> StoreResult<ShoppingList> {
        self.trip(FailPoint::InsertList)?;
        self.require_user(list.owner_user_id, "owner")?;

        let list = ShoppingList {
            id: next_id(&mut self.working.next_list_id),
            name: list.name.clone(),
            description: list.description.clone(),
            owner_user_id: list.owner_user_id,
            created_at: now,
            last_modified_at: now,
            deadline: list.deadline,
            status: ListStatus::Todo,
        };
        self.working.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn find_list(&mut self, list_id: i64) -> StoreResult<Option<ShoppingList>> {
        Ok(self.working.lists.get(&list_id).cloned())
    }

    async fn lock_list(&mut self, list_id: i64) -> StoreResult<Option<ShoppingList>> {
        Ok(self.working.lists.get(&list_id).cloned())
    }

    async fn set_list_status(
        &mut self,
        list_id: i64,
        status: ListStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        if let Some(list) = self.working.lists.get_mut(&list_id) {
            list.status = status;
            list.last_modified_at = at;
        }
        Ok(())
    }

    async fn lists_for_user(&mut self, user_id: i64) -> StoreResult<Vec<ContributedList>> {
        let tables = &self.working;
        let lists = tables
            .contributors
            .values()
            .filter(|c| c.user_id == user_id)
            .filter_map(|c| {
                let list = tables.lists.get(&c.list_id)?;
                if list.status == ListStatus::Deleted {
                    return None;
                }
                let owner = tables.users.get(&list.owner_user_id)?;
                Some(ContributedList {
                    list: list.clone(),
                    owner_username: owner.username.clone(),
                    owner_full_name: owner.full_name.clone(),
                    access_type: c.access_type,
                })
            })
            .collect();

        Ok(lists)
    }

    async fn find_contributor(
        &mut self,
        list_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Contributor>> {
        Ok(self.working.contributors.get(&(list_id, user_id)).cloned())
    }

    async fn upsert_contributor(&mut self, contributor: &Contributor) -> StoreResult<()> {
        self.trip(FailPoint::UpsertContributor)?;
        self.require_list(contributor.list_id)?;
        self.require_user(contributor.user_id, "contributor")?;

        self.working.contributors.insert(
            (contributor.list_id, contributor.user_id),
            contributor.clone(),
        );
        Ok(())
    }

    async fn find_category(&mut self, category_id: i64) -> StoreResult<Option<Category>> {
        Ok(self.working.categories.get(&category_id).cloned())
    }

    async fn find_category_by_name(
        &mut self,
        name: &str,
        kind: &str,
    ) -> StoreResult<Option<Category>> {
        Ok(self
            .working
            .categories
            .values()
            .find(|c| c.name == name && c.kind == kind)
            .cloned())
    }

    async fn insert_category(&mut self, category: &NewCategory) -> StoreResult<Category> {
        self.trip(FailPoint::InsertCategory)?;

        let category = Category {
            id: next_id(&mut self.working.next_category_id),
            name: category.name.clone(),
            kind: category.kind.clone(),
        };
        self.working.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn all_categories(&mut self) -> StoreResult<Vec<Category>> {
        Ok(self.working.categories.values().cloned().collect())
    }

    async fn insert_item(&mut self, item: &NewItem, now: DateTime<Utc>) -> StoreResult<Item> {
        self.trip(FailPoint::InsertItem)?;
        self.require_list(item.list_id)?;
        self.require_user(item.created_by, "creator")?;
        if !self.working.categories.contains_key(&item.category_id) {
            return Err(StoreError::MissingReference(format!(
                "category {}",
                item.category_id
            )));
        }

        let item = Item {
            id: next_id(&mut self.working.next_item_id),
            list_id: item.list_id,
            title: item.title.clone(),
            description: item.description.clone(),
            status: ItemStatus::Todo,
            category_id: item.category_id,
            created_by: item.created_by,
            last_modified_by: item.created_by,
            bought_by: None,
            created_at: now,
            last_modified_at: now,
            bought_at: None,
            deadline: item.deadline,
        };
        self.working.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn lock_item(&mut self, item_id: i64) -> StoreResult<Option<Item>> {
        Ok(self.working.items.get(&item_id).cloned())
    }

    async fn mark_item_bought(
        &mut self,
        item_id: i64,
        buyer_id: i64,
        modified_by: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<Item> {
        self.trip(FailPoint::MarkItemBought)?;
        self.require_user(buyer_id, "buyer")?;

        let item = self
            .working
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StoreError::MissingReference(format!("item {}", item_id)))?;
        item.status = ItemStatus::Bought;
        item.bought_by = Some(buyer_id);
        item.bought_at = Some(at);
        item.last_modified_by = modified_by;
        item.last_modified_at = at;
        Ok(item.clone())
    }

    async fn set_item_status(
        &mut self,
        item_id: i64,
        status: ItemStatus,
        modified_by: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        if let Some(item) = self.working.items.get_mut(&item_id) {
            item.status = status;
            item.last_modified_by = modified_by;
            item.last_modified_at = at;
        }
        Ok(())
    }

    async fn items_for_list(&mut self, list_id: i64) -> StoreResult<Vec<ItemRow>> {
        let tables = &self.working;
        let items = tables
            .items
            .values()
            .filter(|i| i.list_id == list_id && i.status != ItemStatus::Deleted)
            .filter_map(|item| {
                let category = tables.categories.get(&item.category_id)?;
                Some(ItemRow {
                    item: item.clone(),
                    category_name: category.name.clone(),
                    category_type: category.kind.clone(),
                    created_by_username: tables.username(item.created_by)?.to_string(),
                    last_modified_by_username: tables
                        .username(item.last_modified_by)?
                        .to_string(),
                    bought_by_username: item
                        .bought_by
                        .and_then(|id| tables.username(id))
                        .map(str::to_string),
                })
            })
            .collect();

        Ok(items)
    }

    async fn commit(self) -> StoreResult<()> {
        let MemoryTx {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}
