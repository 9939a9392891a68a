use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{SearchTarget, SearchedUser};
use crate::services::store::{DirectoryStore, StoreError};

/// Fetch the records for `user_ids` in one batch and return them in the order the ids were given.
///
/// Ids with no record are skipped; duplicates in `user_ids` are returned once per occurrence.
pub async fn resolve_in_order(
    store: &dyn DirectoryStore,
    user_ids: &[String],
) -> Result<Vec<SearchedUser>, StoreError> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let by_id: HashMap<String, SearchedUser> = store
        .find_users_by_ids(user_ids)
        .await?
        .into_iter()
        .map(|user| (user.user_id.clone(), user))
        .collect();

    Ok(user_ids
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect())
}

/// Keyword search and listing over the colleague directory
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn DirectoryStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// Search every target in request order and concatenate the hits.
    ///
    /// A user matching several targets appears once per matching target.
    pub async fn search_by_keyword(
        &self,
        keyword: &str,
        targets: &[SearchTarget],
    ) -> Result<Vec<SearchedUser>, StoreError> {
        let mut users = Vec::new();

        for target in targets {
            let user_ids = self.store.search_user_ids(*target, keyword).await?;
            let found = resolve_in_order(self.store.as_ref(), &user_ids).await?;
            tracing::info!("{} users found by {}", found.len(), target);
            users.extend(found);
        }

        Ok(users)
    }

    pub async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<SearchedUser>, StoreError> {
        self.store.list_users(limit, offset).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<SearchedUser>, StoreError> {
        let mut users = self.store.find_users_by_ids(&[user_id.to_string()]).await?;
        Ok(users.pop())
    }
}
