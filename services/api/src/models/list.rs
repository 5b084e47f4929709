//! Shopping lists and their contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a list; deletion is soft and final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "list_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    Todo,
    Deleted,
}

impl ListStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListStatus::Todo => "todo",
            ListStatus::Deleted => "deleted",
        }
    }
}

/// Access a contributor row grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "access_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Edit,
    ReadOnly,
}

/// Access an operation requires on a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Edit,
    Owner,
}

impl AccessType {
    /// Whether a contributor row of this type satisfies `required`
    ///
    /// `Owner` is never granted by a contributor row alone.
    pub fn grants(self, required: AccessLevel) -> bool {
        match required {
            AccessLevel::Read => true,
            AccessLevel::Edit => self == AccessType::Edit,
            AccessLevel::Owner => false,
        }
    }
}

/// Stored list
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShoppingList {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub owner_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: ListStatus,
}

/// Columns supplied when inserting a list
#[derive(Debug, Clone)]
pub struct NewList {
    pub name: String,
    pub description: String,
    pub owner_user_id: i64,
    pub deadline: Option<DateTime<Utc>>,
}

/// Stored contributor row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Contributor {
    pub list_id: i64,
    pub user_id: i64,
    pub access_type: AccessType,
    pub valid_until: DateTime<Utc>,
}

/// A list joined with the caller's contributor row and its owner
#[derive(Debug, Clone, FromRow)]
pub struct ContributedList {
    #[sqlx(flatten)]
    pub list: ShoppingList,
    pub owner_username: String,
    pub owner_full_name: String,
    pub access_type: AccessType,
}

/// A list as seen by one viewer
#[derive(Debug, Clone, Serialize)]
pub struct ListSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub owner_user_id: i64,
    pub owner_username: String,
    pub owner_full_name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: ListStatus,
    pub access_type: AccessType,
    pub created_by_me: bool,
}

impl ListSummary {
    /// Annotate a joined row for `viewer`
    pub fn for_viewer(row: ContributedList, viewer: i64) -> Self {
        let ContributedList {
            list,
            owner_username,
            owner_full_name,
            access_type,
        } = row;

        Self {
            created_by_me: list.owner_user_id == viewer,
            id: list.id,
            name: list.name,
            description: list.description,
            owner_user_id: list.owner_user_id,
            owner_username,
            owner_full_name,
            created_at: list.created_at,
            last_modified_at: list.last_modified_at,
            deadline: list.deadline,
            status: list.status,
            access_type,
        }
    }
}

/// Request for list creation
#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
}

/// Request for sharing a list with another user
#[derive(Debug, Deserialize)]
pub struct ShareListRequest {
    pub list_id: i64,
    pub username: String,
    pub access_type: AccessType,
}
