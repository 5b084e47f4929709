//! Item protocols: create, query, buy and delete

use auth::{SessionStore, UserContext, validation};
use chrono::Utc;
use tracing::info;

use super::{Authenticated, ShoppingService};
use crate::authz::{check_access, check_list_state};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    AccessLevel, BuyItemRequest, Category, CategoryInput, CreateItemRequest, CreatedItem, Item,
    ItemStatus, ItemView, ListStatus, NewCategory, NewItem,
};
use crate::repositories::{Store, StoreTx};

/// Resolve the category an item is filed under, creating it when needed
async fn resolve_category<T: StoreTx>(tx: &mut T, input: CategoryInput) -> ServiceResult<Category> {
    if let Some(id) = input.id {
        return tx
            .find_category(id)
            .await?
            .ok_or(ServiceError::NotFound("category"));
    }

    validation::require_text("category.name", &input.name)?;
    if let Some(existing) = tx.find_category_by_name(&input.name, &input.kind).await? {
        return Ok(existing);
    }

    Ok(tx
        .insert_category(&NewCategory {
            name: input.name,
            kind: input.kind,
        })
        .await?)
}

fn require_todo(item: &Item) -> ServiceResult<()> {
    if item.status != ItemStatus::Todo {
        return Err(ServiceError::Conflict(format!(
            "item {} is {}",
            item.id,
            item.status.as_str()
        )));
    }
    Ok(())
}

impl<S: Store, C: SessionStore> ShoppingService<S, C> {
    /// Add an item to a live list the caller may edit
    pub async fn create_item(
        &self,
        ctx: &UserContext,
        request: CreateItemRequest,
    ) -> ServiceResult<Authenticated<CreatedItem>> {
        validation::require_text("title", &request.title)?;

        let created = self
            .bounded(async move {
                let mut tx = self.store.begin().await?;
                check_access(&mut tx, ctx.user_id, request.list_id, AccessLevel::Edit).await?;
                check_list_state(&mut tx, request.list_id, ListStatus::Todo).await?;

                let category = resolve_category(&mut tx, request.category).await?;
                let item = tx
                    .insert_item(
                        &NewItem {
                            list_id: request.list_id,
                            title: request.title,
                            description: request.description,
                            category_id: category.id,
                            created_by: ctx.user_id,
                            deadline: request.deadline,
                        },
                        Utc::now(),
                    )
                    .await?;
                tx.commit().await?;
                Ok(CreatedItem { item, category })
            })
            .await?;

        info!("Item {} added to list {}", created.item.id, created.item.list_id);
        Ok(self.finish(ctx, created).await)
    }

    /// Live items of a list the caller can read
    pub async fn get_list_items(
        &self,
        ctx: &UserContext,
        list_id: i64,
    ) -> ServiceResult<Authenticated<Vec<ItemView>>> {
        let rows = self
            .bounded(async move {
                let mut tx = self.store.begin().await?;
                check_access(&mut tx, ctx.user_id, list_id, AccessLevel::Read).await?;

                let list = tx
                    .find_list(list_id)
                    .await?
                    .ok_or(ServiceError::NotFound("list"))?;
                if list.status == ListStatus::Deleted {
                    return Err(ServiceError::NotFound("list"));
                }

                Ok(tx.items_for_list(list_id).await?)
            })
            .await?;

        let items = rows.into_iter().map(ItemView::from).collect();
        Ok(self.finish(ctx, items).await)
    }

    /// Mark an item bought on behalf of the user named in the request
    pub async fn buy_item(
        &self,
        ctx: &UserContext,
        request: BuyItemRequest,
    ) -> ServiceResult<Authenticated<Item>> {
        validation::require_text("bought_by", &request.bought_by)?;

        let item = self
            .bounded(async move {
                let mut tx = self.store.begin().await?;
                let item = tx
                    .lock_item(request.item_id)
                    .await?
                    .ok_or(ServiceError::NotFound("item"))?;
                check_access(&mut tx, ctx.user_id, item.list_id, AccessLevel::Edit).await?;
                check_list_state(&mut tx, item.list_id, ListStatus::Todo).await?;
                require_todo(&item)?;

                let buyer = tx
                    .find_user_by_username(&request.bought_by)
                    .await?
                    .ok_or(ServiceError::NotFound("user"))?;
                let item = tx
                    .mark_item_bought(item.id, buyer.id, ctx.user_id, Utc::now())
                    .await?;
                tx.commit().await?;
                Ok(item)
            })
            .await?;

        info!("Item {} bought by user {:?}", item.id, item.bought_by);
        Ok(self.finish(ctx, item).await)
    }

    /// Soft-delete an item that has not been bought
    pub async fn delete_item(
        &self,
        ctx: &UserContext,
        item_id: i64,
    ) -> ServiceResult<Authenticated<()>> {
        self.bounded(async move {
            let mut tx = self.store.begin().await?;
            let item = tx
                .lock_item(item_id)
                .await?
                .ok_or(ServiceError::NotFound("item"))?;
            check_access(&mut tx, ctx.user_id, item.list_id, AccessLevel::Edit).await?;
            check_list_state(&mut tx, item.list_id, ListStatus::Todo).await?;
            require_todo(&item)?;

            tx.set_item_status(item.id, ItemStatus::Deleted, ctx.user_id, Utc::now())
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;

        info!("Item {} deleted by user {}", item_id, ctx.user_id);
        Ok(self.finish(ctx, ()).await)
    }
}
