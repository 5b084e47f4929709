//! Item categories

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Global category, deduplicated by `(name, type)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "category_type")]
    #[serde(rename = "type")]
    pub kind: String,
}

/// Columns supplied when inserting a category
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: String,
}

/// Category reference carried by an item creation request
///
/// With an `id` the category must already exist; without one the
/// `(name, type)` pair is looked up and created when missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}
