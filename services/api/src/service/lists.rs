//! List protocols: create, query, share and delete

use auth::{SessionStore, UserContext, validation};
use chrono::Utc;
use tracing::info;

use super::{Authenticated, ShoppingService};
use crate::authz::{check_access, check_list_state};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    AccessLevel, AccessType, Contributor, CreateListRequest, ListStatus, ListSummary, NewList,
    ShareListRequest, ShoppingList,
};
use crate::repositories::{Store, StoreTx};

impl<S: Store, C: SessionStore> ShoppingService<S, C> {
    /// Create a list owned by the caller, with the caller as its first editor
    pub async fn create_list(
        &self,
        ctx: &UserContext,
        request: CreateListRequest,
    ) -> ServiceResult<Authenticated<ShoppingList>> {
        validation::require_text("name", &request.name)?;

        let list = self
            .bounded(async move {
                let now = Utc::now();
                let mut tx = self.store.begin().await?;
                let list = tx
                    .insert_list(
                        &NewList {
                            name: request.name,
                            description: request.description,
                            owner_user_id: ctx.user_id,
                            deadline: request.deadline,
                        },
                        now,
                    )
                    .await?;
                tx.upsert_contributor(&Contributor {
                    list_id: list.id,
                    user_id: ctx.user_id,
                    access_type: AccessType::Edit,
                    valid_until: now + self.share_validity,
                })
                .await?;
                tx.commit().await?;
                Ok(list)
            })
            .await?;

        info!("List {} created by user {}", list.id, ctx.user_id);
        Ok(self.finish(ctx, list).await)
    }

    /// Every live list the caller contributes to, ordered by id
    pub async fn get_lists(
        &self,
        ctx: &UserContext,
    ) -> ServiceResult<Authenticated<Vec<ListSummary>>> {
        let rows = self
            .bounded(async move {
                let mut tx = self.store.begin().await?;
                Ok(tx.lists_for_user(ctx.user_id).await?)
            })
            .await?;

        let lists = rows
            .into_iter()
            .map(|row| ListSummary::for_viewer(row, ctx.user_id))
            .collect();

        Ok(self.finish(ctx, lists).await)
    }

    /// Grant another user access to a list the caller owns
    ///
    /// Sharing again with the same user replaces the earlier grant.
    pub async fn share_list(
        &self,
        ctx: &UserContext,
        request: ShareListRequest,
    ) -> ServiceResult<Authenticated<Contributor>> {
        validation::require_text("username", &request.username)?;

        let contributor = self
            .bounded(async move {
                let mut tx = self.store.begin().await?;
                check_access(&mut tx, ctx.user_id, request.list_id, AccessLevel::Owner).await?;
                check_list_state(&mut tx, request.list_id, ListStatus::Todo).await?;

                let target = tx
                    .find_user_by_username(&request.username)
                    .await?
                    .ok_or(ServiceError::NotFound("user"))?;
                if target.id == ctx.user_id {
                    return Err(ServiceError::Validation(
                        "username: the owner always keeps edit access".to_string(),
                    ));
                }

                let contributor = Contributor {
                    list_id: request.list_id,
                    user_id: target.id,
                    access_type: request.access_type,
                    valid_until: Utc::now() + self.share_validity,
                };
                tx.upsert_contributor(&contributor).await?;
                tx.commit().await?;
                Ok(contributor)
            })
            .await?;

        info!(
            "List {} shared with user {} as {:?}",
            contributor.list_id, contributor.user_id, contributor.access_type
        );
        Ok(self.finish(ctx, contributor).await)
    }

    /// Soft-delete a list; its items stay untouched but unreachable
    pub async fn delete_list(
        &self,
        ctx: &UserContext,
        list_id: i64,
    ) -> ServiceResult<Authenticated<()>> {
        self.bounded(async move {
            let mut tx = self.store.begin().await?;
            check_access(&mut tx, ctx.user_id, list_id, AccessLevel::Edit).await?;
            check_list_state(&mut tx, list_id, ListStatus::Todo).await?;

            tx.set_list_status(list_id, ListStatus::Deleted, Utc::now())
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;

        info!("List {} deleted by user {}", list_id, ctx.user_id);
        Ok(self.finish(ctx, ()).await)
    }
}
