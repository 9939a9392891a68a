use async_trait::async_trait;
use thiserror::Error;

use crate::models::{MatchGroupDetail, Owner, SearchTarget, SearchedUser, StatusFilter, UserPredicate};

/// Errors that can occur when reading from or writing to the directory store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Writing a match group failed and the unit of work was rolled back
    #[error("Failed to persist match group {match_group_id}: {message}")]
    Persistence {
        match_group_id: String,
        message: String,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Stored match group row without its members resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroupRecord {
    pub match_group_id: String,
    pub match_group_name: String,
    pub description: String,
    pub status: crate::models::MatchGroupStatus,
    pub created_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub member_ids: Vec<String>,
}

/// Data access the matching and directory services depend on.
///
/// Every method is a set-based read or a single unit of work; callers never
/// see partial writes.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Ids of all users satisfying the predicate
    async fn find_user_ids(&self, predicate: &UserPredicate) -> Result<Vec<String>, StoreError>;

    /// Full records for the given ids. Empty input returns an empty result without querying.
    async fn find_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<SearchedUser>, StoreError>;

    /// Distinct ids of every user who shared a match group with `user_id`, excluding `user_id`
    async fn find_previously_matched_user_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError>;

    async fn skill_name_exists(&self, skill_name: &str) -> Result<bool, StoreError>;

    /// Resolve the owner profile, `None` when the user does not exist
    async fn get_owner_profile(&self, user_id: &str) -> Result<Option<Owner>, StoreError>;

    /// Insert the match group row and one membership row per member atomically
    async fn insert_match_group(&self, detail: &MatchGroupDetail) -> Result<(), StoreError>;

    /// Ids of users whose `target` attribute matches `keyword`
    async fn search_user_ids(&self, target: SearchTarget, keyword: &str) -> Result<Vec<String>, StoreError>;

    async fn get_match_group(
        &self,
        match_group_id: &str,
        status: StatusFilter,
    ) -> Result<Option<MatchGroupRecord>, StoreError>;

    /// Every listed match group admitted by `status`, members included, in one read.
    ///
    /// Records come back in the order of `match_group_ids`; unknown ids are skipped.
    async fn get_match_groups(
        &self,
        match_group_ids: &[String],
        status: StatusFilter,
    ) -> Result<Vec<MatchGroupRecord>, StoreError>;

    async fn find_match_group_ids_by_user(&self, user_id: &str) -> Result<Vec<String>, StoreError>;

    /// Users ordered by entry date then kana
    async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<SearchedUser>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
