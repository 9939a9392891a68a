use std::collections::HashSet;

use crate::models::{DepartmentFilter, MatchGroupConfig, OfficeFilter, Owner, UserPredicate};

/// Deduplicated candidate user ids, kept in first-seen order
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    ids: Vec<String>,
    seen: HashSet<String>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ids to the pool, returning how many were new
    pub fn extend<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.ids.len();
        for id in ids {
            if self.seen.insert(id.clone()) {
                self.ids.push(id);
            }
        }
        self.ids.len() - before
    }

    pub fn remove(&mut self, id: &str) -> bool {
        if self.seen.remove(id) {
            self.ids.retain(|candidate| candidate != id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<String> {
        self.ids
    }
}

impl FromIterator<String> for CandidatePool {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut pool = CandidatePool::new();
        pool.extend(iter);
        pool
    }
}

/// Translate the active department, office and skill filters into store predicates.
///
/// The `only...` variants leave the owner out; the `exclude...` variants do
/// not, and their results are unioned as-is.
pub fn filter_predicates(owner: &Owner, config: &MatchGroupConfig) -> Vec<(&'static str, UserPredicate)> {
    let mut predicates = Vec::with_capacity(3);

    match config.department_filter {
        DepartmentFilter::OnlyMyDepartment => predicates.push((
            "department",
            UserPredicate::InDepartment {
                department_id: owner.department_id.clone(),
                excluding: Some(owner.user_id.clone()),
            },
        )),
        DepartmentFilter::ExcludeMyDepartment => predicates.push((
            "department",
            UserPredicate::NotInDepartment {
                department_id: owner.department_id.clone(),
            },
        )),
        DepartmentFilter::None => {}
    }

    match config.office_filter {
        OfficeFilter::OnlyMyOffice => predicates.push((
            "office",
            UserPredicate::InOffice {
                office_id: owner.office_id.clone(),
                excluding: Some(owner.user_id.clone()),
            },
        )),
        OfficeFilter::ExcludeMyOffice => predicates.push((
            "office",
            UserPredicate::NotInOffice {
                office_id: owner.office_id.clone(),
            },
        )),
        OfficeFilter::None => {}
    }

    if !config.skill_filter.is_empty() {
        predicates.push(("skill", UserPredicate::HasAnySkill(config.skill_filter.clone())));
    }

    predicates
}

/// Ids the unfiltered draw must skip: the owner, plus past partners when requested
pub fn exclusion_set(owner: &Owner, previously_matched: Vec<String>) -> Vec<String> {
    let mut excluded = vec![owner.user_id.clone()];
    excluded.extend(previously_matched.into_iter().filter(|id| id != &owner.user_id));
    excluded
}
