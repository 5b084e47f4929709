//! Authorization checks for list and item operations
//!
//! Both checks run inside the caller's transaction, before any write, so a
//! rejected request never touches a row. A missing contributor row and an
//! insufficient one are reported the same way, which keeps list existence
//! hidden from non-contributors.

use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{AccessLevel, Contributor, ListStatus, ShoppingList};
use crate::repositories::StoreTx;

/// Why an access check failed, for logs only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denial {
    NoContributor,
    InsufficientAccess,
    NotOwner,
}

fn deny(denial: Denial, user_id: i64, list_id: i64, required: AccessLevel) -> ServiceError {
    debug!(user_id, list_id, ?required, ?denial, "Access denied");
    ServiceError::Unauthorized
}

/// Verify that `user_id` holds at least `required` on `list_id`
///
/// `Owner` compares against the list's owner and locks the list row.
pub async fn check_access<T: StoreTx>(
    tx: &mut T,
    user_id: i64,
    list_id: i64,
    required: AccessLevel,
) -> ServiceResult<Option<Contributor>> {
    if required == AccessLevel::Owner {
        return match tx.lock_list(list_id).await? {
            Some(list) if list.owner_user_id == user_id => Ok(None),
            Some(_) => Err(deny(Denial::NotOwner, user_id, list_id, required)),
            None => Err(deny(Denial::NoContributor, user_id, list_id, required)),
        };
    }

    match tx.find_contributor(list_id, user_id).await? {
        None => Err(deny(Denial::NoContributor, user_id, list_id, required)),
        Some(row) if !row.access_type.grants(required) => {
            Err(deny(Denial::InsufficientAccess, user_id, list_id, required))
        }
        Some(row) => Ok(Some(row)),
    }
}

/// Lock `list_id` and require it to be in `required` status
pub async fn check_list_state<T: StoreTx>(
    tx: &mut T,
    list_id: i64,
    required: ListStatus,
) -> ServiceResult<ShoppingList> {
    let list = tx
        .lock_list(list_id)
        .await?
        .ok_or(ServiceError::NotFound("list"))?;

    if list.status != required {
        return Err(ServiceError::Conflict(format!(
            "list {} is {}",
            list_id,
            list.status.as_str()
        )));
    }

    Ok(list)
}
