//! PostgreSQL repository backend

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::models::{
    Category, ContributedList, Contributor, Item, ItemRow, ItemStatus, ListStatus, NewCategory,
    NewItem, NewList, NewUser, ShoppingList, User, UserStatus,
};

const USER_COLUMNS: &str = "id, username, password_hash, full_name, email, status, \
                            created_at, updated_at, last_logged_in_at";

const LIST_COLUMNS: &str =
    "id, name, description, owner_user_id, created_at, last_modified_at, deadline, status";

const ITEM_COLUMNS: &str = "id, list_id, title, description, status, category_id, created_by, \
                            last_modified_by, bought_by, created_at, last_modified_at, \
                            bought_at, deadline";

/// Classify constraint violations raised by a write
fn classify(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(what.to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::MissingReference(what.to_string())
        }
        _ => StoreError::Database(err),
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(common::database::health_check(&self.pool)
            .await
            .unwrap_or(false))
    }
}

/// Open PostgreSQL transaction; sqlx rolls it back when dropped uncommitted
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl StoreTx for PgTx {
    async fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn insert_user(&mut self, user: &NewUser, now: DateTime<Utc>) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, full_name, email, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(UserStatus::Active)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| classify(e, &format!("username {}", user.username)))
    }

    async fn record_login(&mut self, user_id: i64, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_logged_in_at = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_list(&mut self, list: &NewList, now: DateTime<Utc>) -> StoreResult<ShoppingList> {
        sqlx::query_as::<_, ShoppingList>(&format!(
            r#"
            INSERT INTO lists (name, description, owner_user_id, created_at, last_modified_at, deadline, status)
            VALUES ($1, $2, $3, $4, $4, $5, $6)
            RETURNING {LIST_COLUMNS}
            "#
        ))
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.owner_user_id)
        .bind(now)
        .bind(list.deadline)
        .bind(ListStatus::Todo)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| classify(e, "list owner"))
    }

    async fn find_list(&mut self, list_id: i64) -> StoreResult<Option<ShoppingList>> {
        let list = sqlx::query_as::<_, ShoppingList>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE id = $1"
        ))
        .bind(list_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(list)
    }

    async fn lock_list(&mut self, list_id: i64) -> StoreResult<Option<ShoppingList>> {
        let list = sqlx::query_as::<_, ShoppingList>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE id = $1 FOR UPDATE"
        ))
        .bind(list_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(list)
    }

    async fn set_list_status(
        &mut self,
        list_id: i64,
        status: ListStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE lists SET status = $2, last_modified_at = $3 WHERE id = $1")
            .bind(list_id)
            .bind(status)
            .bind(at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn lists_for_user(&mut self, user_id: i64) -> StoreResult<Vec<ContributedList>> {
        let lists = sqlx::query_as::<_, ContributedList>(
            r#"
            SELECT l.id, l.name, l.description, l.owner_user_id, l.created_at,
                   l.last_modified_at, l.deadline, l.status,
                   u.username AS owner_username, u.full_name AS owner_full_name,
                   c.access_type
            FROM contributors c
            JOIN lists l ON l.id = c.list_id
            JOIN users u ON u.id = l.owner_user_id
            WHERE c.user_id = $1 AND l.status <> $2
            ORDER BY l.id ASC
            "#,
        )
        .bind(user_id)
        .bind(ListStatus::Deleted)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(lists)
    }

    async fn find_contributor(
        &mut self,
        list_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Contributor>> {
        let contributor = sqlx::query_as::<_, Contributor>(
            r#"
            SELECT list_id, user_id, access_type, valid_until
            FROM contributors
            WHERE list_id = $1 AND user_id = $2
            "#,
        )
        .bind(list_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(contributor)
    }

    async fn upsert_contributor(&mut self, contributor: &Contributor) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contributors (list_id, user_id, access_type, valid_until)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (list_id, user_id)
            DO UPDATE SET access_type = EXCLUDED.access_type, valid_until = EXCLUDED.valid_until
            "#,
        )
        .bind(contributor.list_id)
        .bind(contributor.user_id)
        .bind(contributor.access_type)
        .bind(contributor.valid_until)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| classify(e, "contributor list or user"))?;

        Ok(())
    }

    async fn find_category(&mut self, category_id: i64) -> StoreResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, category_type FROM categories WHERE id = $1",
        )
        .bind(category_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(category)
    }

    async fn find_category_by_name(
        &mut self,
        name: &str,
        kind: &str,
    ) -> StoreResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, category_type
            FROM categories
            WHERE name = $1 AND category_type = $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(kind)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(category)
    }

    async fn insert_category(&mut self, category: &NewCategory) -> StoreResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, category_type)
            VALUES ($1, $2)
            RETURNING id, name, category_type
            "#,
        )
        .bind(&category.name)
        .bind(&category.kind)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!("Inserted category: {}", category.id);
        Ok(category)
    }

    async fn all_categories(&mut self) -> StoreResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, category_type FROM categories ORDER BY id ASC",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(categories)
    }

    async fn insert_item(&mut self, item: &NewItem, now: DateTime<Utc>) -> StoreResult<Item> {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (list_id, title, description, status, category_id, created_by,
                               last_modified_by, created_at, last_modified_at, deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $7, $8)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item.list_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(ItemStatus::Todo)
        .bind(item.category_id)
        .bind(item.created_by)
        .bind(now)
        .bind(item.deadline)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| classify(e, "item list, category or creator"))
    }

    async fn lock_item(&mut self, item_id: i64) -> StoreResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 FOR UPDATE"
        ))
        .bind(item_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(item)
    }

    async fn mark_item_bought(
        &mut self,
        item_id: i64,
        buyer_id: i64,
        modified_by: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<Item> {
        let item = sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET status = $2, bought_by = $3, bought_at = $5,
                last_modified_by = $4, last_modified_at = $5
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(ItemStatus::Bought)
        .bind(buyer_id)
        .bind(modified_by)
        .bind(at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(item)
    }

    async fn set_item_status(
        &mut self,
        item_id: i64,
        status: ItemStatus,
        modified_by: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE items
            SET status = $2, last_modified_by = $3, last_modified_at = $4
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .bind(status)
        .bind(modified_by)
        .bind(at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn items_for_list(&mut self, list_id: i64) -> StoreResult<Vec<ItemRow>> {
        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT i.id, i.list_id, i.title, i.description, i.status, i.category_id,
                   i.created_by, i.last_modified_by, i.bought_by, i.created_at,
                   i.last_modified_at, i.bought_at, i.deadline,
                   c.name AS category_name, c.category_type AS category_type,
                   cu.username AS created_by_username,
                   mu.username AS last_modified_by_username,
                   bu.username AS bought_by_username
            FROM items i
            JOIN categories c ON c.id = i.category_id
            JOIN users cu ON cu.id = i.created_by
            JOIN users mu ON mu.id = i.last_modified_by
            LEFT JOIN users bu ON bu.id = i.bought_by
            WHERE i.list_id = $1 AND i.status <> $2
            ORDER BY i.id ASC
            "#,
        )
        .bind(list_id)
        .bind(ItemStatus::Deleted)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(items)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
