//! List items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UserRef;
use super::category::{Category, CategoryInput};

/// Item lifecycle: `todo` moves to `bought` or `deleted` and never back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Todo,
    Bought,
    Deleted,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Todo => "todo",
            ItemStatus::Bought => "bought",
            ItemStatus::Deleted => "deleted",
        }
    }
}

/// Stored item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub list_id: i64,
    pub title: String,
    pub description: String,
    pub status: ItemStatus,
    pub category_id: i64,
    pub created_by: i64,
    pub last_modified_by: i64,
    pub bought_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub bought_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Columns supplied when inserting an item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub list_id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub created_by: i64,
    pub deadline: Option<DateTime<Utc>>,
}

/// An item joined with its category and the usernames it references
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    #[sqlx(flatten)]
    pub item: Item,
    pub category_name: String,
    pub category_type: String,
    pub created_by_username: String,
    pub last_modified_by_username: String,
    pub bought_by_username: Option<String>,
}

/// An item as returned to list contributors
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub id: i64,
    pub list_id: i64,
    pub title: String,
    pub description: String,
    pub status: ItemStatus,
    pub category: Category,
    pub created_by: UserRef,
    pub last_modified_by: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bought_by: Option<UserRef>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bought_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
}

impl From<ItemRow> for ItemView {
    fn from(row: ItemRow) -> Self {
        let ItemRow {
            item,
            category_name,
            category_type,
            created_by_username,
            last_modified_by_username,
            bought_by_username,
        } = row;

        let bought_by = match (item.bought_by, bought_by_username) {
            (Some(id), Some(username)) => Some(UserRef { id, username }),
            _ => None,
        };

        Self {
            id: item.id,
            list_id: item.list_id,
            title: item.title,
            description: item.description,
            status: item.status,
            category: Category {
                id: item.category_id,
                name: category_name,
                kind: category_type,
            },
            created_by: UserRef {
                id: item.created_by,
                username: created_by_username,
            },
            last_modified_by: UserRef {
                id: item.last_modified_by,
                username: last_modified_by_username,
            },
            bought_by,
            created_at: item.created_at,
            last_modified_at: item.last_modified_at,
            bought_at: item.bought_at,
            deadline: item.deadline,
        }
    }
}

/// Request for item creation
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub list_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: CategoryInput,
}

/// Response for item creation
#[derive(Debug, Clone, Serialize)]
pub struct CreatedItem {
    pub item: Item,
    pub category: Category,
}

/// Request for marking an item bought on behalf of `bought_by`
#[derive(Debug, Deserialize)]
pub struct BuyItemRequest {
    pub item_id: i64,
    pub bought_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(bought_by: Option<i64>, bought_by_username: Option<&str>) -> ItemRow {
        let now = Utc::now();
        ItemRow {
            item: Item {
                id: 3,
                list_id: 1,
                title: "Milk".to_string(),
                description: String::new(),
                status: ItemStatus::Todo,
                category_id: 2,
                created_by: 10,
                last_modified_by: 11,
                bought_by,
                created_at: now,
                last_modified_at: now,
                bought_at: None,
                deadline: None,
            },
            category_name: "Dairy".to_string(),
            category_type: "food".to_string(),
            created_by_username: "alice".to_string(),
            last_modified_by_username: "bob".to_string(),
            bought_by_username: bought_by_username.map(str::to_string),
        }
    }

    #[test]
    fn test_view_omits_buyer_until_bought() {
        let view = ItemView::from(row(None, None));
        assert!(view.bought_by.is_none());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("bought_by").is_none());
        assert_eq!(json["category"]["type"], "food");
        assert_eq!(json["created_by"]["username"], "alice");
    }

    #[test]
    fn test_view_carries_buyer() {
        let view = ItemView::from(row(Some(12), Some("carol")));
        assert_eq!(
            view.bought_by,
            Some(UserRef {
                id: 12,
                username: "carol".to_string()
            })
        );
        assert_eq!(view.last_modified_by.username, "bob");
    }
}
