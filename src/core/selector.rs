use std::sync::Arc;

use rand::Rng;

use crate::core::{
    pool::{exclusion_set, filter_predicates, CandidatePool},
    sampling::draw_distinct,
};
use crate::models::{MatchGroupConfig, Owner, User, UserPredicate};
use crate::services::store::{DirectoryStore, StoreError};
use crate::services::users::resolve_in_order;

/// Picks the members of a new match group
///
/// # Selection
/// 1. Without department/office/skill filters: everyone except the owner
///    (and past partners when `never_matched_filter` is set) is eligible.
/// 2. With filters: the eligible pool is the union of every active filter,
///    plus past partners when `never_matched_filter` is set.
/// 3. `num_of_members - 1` ids are drawn uniformly from the pool and the
///    owner is appended last.
#[derive(Clone)]
pub struct MemberSelector {
    store: Arc<dyn DirectoryStore>,
}

impl MemberSelector {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// Select the members for `config`, owner last.
    ///
    /// Returns `Ok(None)` when the pool cannot supply `num_of_members - 1`
    /// distinct colleagues.
    pub async fn select_members<R>(
        &self,
        owner: &Owner,
        config: &MatchGroupConfig,
        rng: &mut R,
    ) -> Result<Option<Vec<User>>, StoreError>
    where
        R: Rng + Send,
    {
        let needed = config.others_needed();
        let pool = self.candidate_pool(owner, config).await?;

        tracing::info!("found {} users as candidates for owner {}", pool.len(), owner.user_id);

        let available = pool.len();
        let Some(mut member_ids) = draw_distinct(pool.into_ids(), needed, rng) else {
            tracing::warn!(
                "not enough candidates for owner {}: {} available, {} needed",
                owner.user_id,
                available,
                needed
            );
            return Ok(None);
        };

        member_ids.push(owner.user_id.clone());

        let members = resolve_in_order(self.store.as_ref(), &member_ids).await?;
        if members.len() != member_ids.len() {
            let missing: Vec<&String> = member_ids
                .iter()
                .filter(|id| !members.iter().any(|member| &member.user_id == *id))
                .collect();
            return Err(StoreError::NotFound(format!("users {:?}", missing)));
        }

        Ok(Some(members.into_iter().map(User::from).collect()))
    }

    /// Build the deduplicated pool of ids eligible for the draw, owner removed
    pub async fn candidate_pool(
        &self,
        owner: &Owner,
        config: &MatchGroupConfig,
    ) -> Result<CandidatePool, StoreError> {
        let mut pool = CandidatePool::new();

        if !config.has_active_filters() {
            let previously_matched = if config.never_matched_filter {
                self.store.find_previously_matched_user_ids(&owner.user_id).await?
            } else {
                Vec::new()
            };
            let excluded = exclusion_set(owner, previously_matched);
            tracing::debug!("excluding {} users from the unfiltered draw", excluded.len());

            pool.extend(self.store.find_user_ids(&UserPredicate::AllExcept(excluded)).await?);
            pool.remove(&owner.user_id);
            return Ok(pool);
        }

        for (label, predicate) in filter_predicates(owner, config) {
            let added = pool.extend(self.store.find_user_ids(&predicate).await?);
            tracing::debug!("{} filter added {} candidates", label, added);
        }

        // Past partners join the pool rather than leave it.
        if config.never_matched_filter {
            let added = pool.extend(self.store.find_previously_matched_user_ids(&owner.user_id).await?);
            tracing::debug!("never matched filter added {} candidates", added);
        }

        pool.remove(&owner.user_id);
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DepartmentFilter, OfficeFilter};
    use crate::services::memory::{InMemoryStore, MemberRecord};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store.add_user(MemberRecord::new("u1", "Owner").office("o1", "Tokyo").department("d1", "Eng").skills(&["Rust"]));
        store.add_user(MemberRecord::new("u2", "Aoi").office("o1", "Tokyo").department("d1", "Eng"));
        store.add_user(MemberRecord::new("u3", "Ren").office("o2", "Osaka").department("d1", "Eng"));
        store.add_user(MemberRecord::new("u4", "Mio").office("o2", "Osaka").department("d2", "Sales").skills(&["Go"]));
        store.add_user(MemberRecord::new("u5", "Sora").office("o3", "Fukuoka").department("d3", "HR"));
        Arc::new(store)
    }

    fn config(num_of_members: usize) -> MatchGroupConfig {
        MatchGroupConfig {
            owner_id: "u1".to_string(),
            match_group_name: "lunch".to_string(),
            description: String::new(),
            num_of_members,
            department_filter: DepartmentFilter::None,
            office_filter: OfficeFilter::None,
            skill_filter: vec![],
            never_matched_filter: false,
        }
    }

    async fn owner_of(store: &InMemoryStore) -> Owner {
        store.get_owner_profile("u1").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_unfiltered_selection_includes_owner_last() {
        let store = store();
        let owner = owner_of(&store).await;
        let selector = MemberSelector::new(store);
        let mut rng = StdRng::seed_from_u64(3);

        let members = selector.select_members(&owner, &config(3), &mut rng).await.unwrap().unwrap();

        assert_eq!(members.len(), 3);
        assert_eq!(members.last().unwrap().user_id, "u1");
        let ids: HashSet<_> = members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_single_member_group_is_owner_only() {
        let store = store();
        let owner = owner_of(&store).await;
        let selector = MemberSelector::new(store);
        let mut rng = StdRng::seed_from_u64(3);

        let members = selector.select_members(&owner, &config(1), &mut rng).await.unwrap().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_unfiltered_selection_reports_shortage() {
        let store = store();
        let owner = owner_of(&store).await;
        let selector = MemberSelector::new(store);
        let mut rng = StdRng::seed_from_u64(3);

        // Only four colleagues exist besides the owner.
        let result = selector.select_members(&owner, &config(6), &mut rng).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_only_my_department_pool() {
        let store = store();
        let owner = owner_of(&store).await;
        let selector = MemberSelector::new(store);

        let mut cfg = config(2);
        cfg.department_filter = DepartmentFilter::OnlyMyDepartment;
        let pool = selector.candidate_pool(&owner, &cfg).await.unwrap();

        assert_eq!(pool.as_slice(), &["u2", "u3"]);
    }

    #[tokio::test]
    async fn test_filters_union_rather_than_intersect() {
        let store = store();
        let owner = owner_of(&store).await;
        let selector = MemberSelector::new(store);

        let mut cfg = config(2);
        cfg.office_filter = OfficeFilter::OnlyMyOffice;
        cfg.skill_filter = vec!["Go".to_string()];
        let pool = selector.candidate_pool(&owner, &cfg).await.unwrap();

        assert_eq!(pool.as_slice(), &["u2", "u4"]);
    }

    #[tokio::test]
    async fn test_skill_pool_never_contains_owner() {
        let store = store();
        let owner = owner_of(&store).await;
        let selector = MemberSelector::new(store);

        let mut cfg = config(2);
        cfg.skill_filter = vec!["Rust".to_string()];
        let pool = selector.candidate_pool(&owner, &cfg).await.unwrap();

        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_filtered_selection_reports_shortage() {
        let store = store();
        let owner = owner_of(&store).await;
        let selector = MemberSelector::new(store);
        let mut rng = StdRng::seed_from_u64(9);

        let mut cfg = config(4);
        cfg.department_filter = DepartmentFilter::OnlyMyDepartment;
        assert!(selector.select_members(&owner, &cfg, &mut rng).await.unwrap().is_none());
    }
}
