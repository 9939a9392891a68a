use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SubsecRound, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use uuid::Uuid;

use crate::core::MemberSelector;
use crate::models::{MatchGroup, MatchGroupConfig, MatchGroupDetail, MatchGroupStatus, StatusFilter, User};
use crate::services::store::{DirectoryStore, MatchGroupRecord, StoreError};
use crate::services::users::resolve_in_order;

/// Errors that can occur while assembling a match group
#[derive(Debug, Error)]
pub enum MatchGroupError {
    #[error("Owner not found: {0}")]
    OwnerNotFound(String),

    /// The group could not be written; nothing was persisted
    #[error("Persistence failed: {0}")]
    Persistence(StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates match groups and reads them back
pub struct MatchGroupService {
    store: Arc<dyn DirectoryStore>,
    selector: MemberSelector,
    rng: Mutex<StdRng>,
}

impl MatchGroupService {
    /// Create the service; a fixed `rng_seed` makes every draw reproducible
    pub fn new(store: Arc<dyn DirectoryStore>, rng_seed: Option<u64>) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            selector: MemberSelector::new(store.clone()),
            store,
            rng: Mutex::new(rng),
        }
    }

    /// Derive a per-request generator so the shared one is never locked across an await
    fn request_rng(&self) -> StdRng {
        let mut parent = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        StdRng::from_rng(&mut *parent)
    }

    /// Return the first skill name, in the given order, that is not registered
    pub async fn check_skills_registered(&self, skill_names: &[String]) -> Result<Option<String>, StoreError> {
        for skill_name in skill_names {
            if !self.store.skill_name_exists(skill_name).await? {
                return Ok(Some(skill_name.clone()));
            }
        }

        Ok(None)
    }

    /// Select members for `config` and persist the new group.
    ///
    /// `Ok(None)` means not enough candidates matched the filters; nothing is written then.
    pub async fn create_match_group(
        &self,
        config: &MatchGroupConfig,
    ) -> Result<Option<MatchGroupDetail>, MatchGroupError> {
        let owner = self
            .store
            .get_owner_profile(&config.owner_id)
            .await?
            .ok_or_else(|| MatchGroupError::OwnerNotFound(config.owner_id.clone()))?;

        let mut rng = self.request_rng();
        let Some(members) = self.selector.select_members(&owner, config, &mut rng).await? else {
            return Ok(None);
        };

        let detail = MatchGroupDetail {
            match_group_id: Uuid::new_v4().to_string(),
            match_group_name: config.match_group_name.clone(),
            description: config.description.clone(),
            members,
            status: MatchGroupStatus::Open,
            created_by: config.owner_id.clone(),
            // TIMESTAMPTZ keeps microseconds
            created_at: Utc::now().trunc_subsecs(6),
        };

        self.store
            .insert_match_group(&detail)
            .await
            .map_err(MatchGroupError::Persistence)?;

        tracing::info!(
            "Created match group {} for owner {} with {} members",
            detail.match_group_id,
            detail.created_by,
            detail.members.len()
        );

        Ok(Some(detail))
    }

    /// Load a match group with its members resolved
    pub async fn get_match_group_detail(
        &self,
        match_group_id: &str,
        status: StatusFilter,
    ) -> Result<Option<MatchGroupDetail>, StoreError> {
        match self.store.get_match_group(match_group_id, status).await? {
            Some(record) => Ok(Some(self.to_detail(record).await?)),
            None => Ok(None),
        }
    }

    /// Every match group `user_id` belongs to, without descriptions.
    ///
    /// Groups are read in one batch and all their members resolved in one more.
    pub async fn list_match_groups_for_user(
        &self,
        user_id: &str,
        status: StatusFilter,
    ) -> Result<Vec<MatchGroup>, StoreError> {
        let match_group_ids = self.store.find_match_group_ids_by_user(user_id).await?;
        if match_group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.store.get_match_groups(&match_group_ids, status).await?;

        let mut seen = HashSet::new();
        let member_ids: Vec<String> = records
            .iter()
            .flat_map(|record| record.member_ids.iter())
            .filter(|&id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let users: HashMap<String, User> = self
            .store
            .find_users_by_ids(&member_ids)
            .await?
            .into_iter()
            .map(|user| (user.user_id.clone(), User::from(user)))
            .collect();

        let match_groups: Vec<MatchGroup> = records
            .into_iter()
            .map(|record| MatchGroup {
                members: record
                    .member_ids
                    .iter()
                    .filter_map(|id| users.get(id).cloned())
                    .collect(),
                match_group_id: record.match_group_id,
                match_group_name: record.match_group_name,
                status: record.status,
                created_by: record.created_by,
                created_at: record.created_at,
            })
            .collect();

        tracing::debug!("User {} belongs to {} match groups", user_id, match_groups.len());
        Ok(match_groups)
    }

    async fn to_detail(&self, record: MatchGroupRecord) -> Result<MatchGroupDetail, StoreError> {
        let members = resolve_in_order(self.store.as_ref(), &record.member_ids)
            .await?
            .into_iter()
            .map(User::from)
            .collect();

        Ok(MatchGroupDetail {
            match_group_id: record.match_group_id,
            match_group_name: record.match_group_name,
            description: record.description,
            members,
            status: record.status,
            created_by: record.created_by,
            created_at: record.created_at,
        })
    }
}
