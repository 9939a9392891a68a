use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{DepartmentFilter, MatchGroupConfig, OfficeFilter, SearchTarget, StatusFilter};

/// Request to create a match group
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMatchGroupRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "owner_id", rename = "ownerId")]
    pub owner_id: String,
    #[validate(length(min = 1, max = 50))]
    #[serde(alias = "match_group_name", rename = "matchGroupName")]
    pub match_group_name: String,
    #[validate(length(max = 120))]
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1))]
    #[serde(alias = "num_of_members", rename = "numOfMembers")]
    pub num_of_members: usize,
    #[serde(default, rename = "departmentFilter")]
    pub department_filter: DepartmentFilter,
    #[serde(default, rename = "officeFilter")]
    pub office_filter: OfficeFilter,
    #[serde(default, rename = "skillFilter")]
    pub skill_filter: Vec<String>,
    #[serde(default, rename = "neverMatchedFilter")]
    pub never_matched_filter: bool,
}

impl From<CreateMatchGroupRequest> for MatchGroupConfig {
    fn from(req: CreateMatchGroupRequest) -> Self {
        Self {
            owner_id: req.owner_id,
            match_group_name: req.match_group_name,
            description: req.description,
            num_of_members: req.num_of_members,
            department_filter: req.department_filter,
            office_filter: req.office_filter,
            skill_filter: req.skill_filter,
            never_matched_filter: req.never_matched_filter,
        }
    }
}

/// Query for paginated listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Query for listing the match groups of a user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchGroupListQuery {
    #[serde(default)]
    pub status: StatusFilter,
}

/// Keyword search query
///
/// `target` is a comma separated list, e.g. `userName,skill`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1))]
    pub q: String,
    pub target: Option<String>,
}

impl SearchQuery {
    /// Parse the requested targets in order; every target when none are given.
    pub fn targets(&self) -> Result<Vec<SearchTarget>, String> {
        match self.target.as_deref() {
            None | Some("") => Ok(SearchTarget::ALL.to_vec()),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<SearchTarget>())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let req = CreateMatchGroupRequest {
            owner_id: "u1".to_string(),
            match_group_name: String::new(),
            description: String::new(),
            num_of_members: 0,
            department_filter: DepartmentFilter::None,
            office_filter: OfficeFilter::None,
            skill_filter: vec![],
            never_matched_filter: false,
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("match_group_name"));
        assert!(fields.contains_key("num_of_members"));
    }

    #[test]
    fn test_search_targets_keep_request_order() {
        let query = SearchQuery {
            q: "tanaka".to_string(),
            target: Some("skill, userName,skill".to_string()),
        };

        assert_eq!(
            query.targets().unwrap(),
            vec![SearchTarget::Skill, SearchTarget::UserName, SearchTarget::Skill]
        );
    }

    #[test]
    fn test_search_targets_default_to_all() {
        let query = SearchQuery { q: "x".to_string(), target: None };
        assert_eq!(query.targets().unwrap().len(), 8);
    }

    #[test]
    fn test_search_targets_reject_unknown() {
        let query = SearchQuery { q: "x".to_string(), target: Some("nickname".to_string()) };
        assert!(query.targets().is_err());
    }
}
