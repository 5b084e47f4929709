//! Category query

use auth::{SessionStore, UserContext};

use super::{Authenticated, ShoppingService};
use crate::error::ServiceResult;
use crate::models::Category;
use crate::repositories::{Store, StoreTx};

impl<S: Store, C: SessionStore> ShoppingService<S, C> {
    /// Every category; categories are global, so any caller may read them
    pub async fn get_all_categories(
        &self,
        ctx: &UserContext,
    ) -> ServiceResult<Authenticated<Vec<Category>>> {
        let categories = self
            .bounded(async move {
                let mut tx = self.store.begin().await?;
                Ok(tx.all_categories().await?)
            })
            .await?;

        Ok(self.finish(ctx, categories).await)
    }
}
