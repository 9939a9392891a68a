use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Icon file attached to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIcon {
    #[serde(rename = "fileId")]
    pub file_id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

/// Public identity record of a colleague
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "userIcon")]
    pub user_icon: UserIcon,
    #[serde(rename = "officeName")]
    pub office_name: String,
}

/// User record as returned by directory lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchedUser {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub kana: String,
    #[serde(rename = "entryDate")]
    pub entry_date: NaiveDate,
    #[serde(rename = "userIcon")]
    pub user_icon: UserIcon,
    #[serde(rename = "officeName")]
    pub office_name: String,
}

impl From<SearchedUser> for User {
    fn from(user: SearchedUser) -> Self {
        Self {
            user_id: user.user_id,
            user_name: user.user_name,
            user_icon: user.user_icon,
            office_name: user.office_name,
        }
    }
}

/// The user requesting a match group, with the ids needed to resolve filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "userIcon")]
    pub user_icon: UserIcon,
    #[serde(rename = "officeName")]
    pub office_name: String,
    #[serde(rename = "officeId")]
    pub office_id: String,
    #[serde(rename = "departmentId")]
    pub department_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepartmentFilter {
    #[default]
    None,
    OnlyMyDepartment,
    ExcludeMyDepartment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OfficeFilter {
    #[default]
    None,
    OnlyMyOffice,
    ExcludeMyOffice,
}

/// Input configuration for a match group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchGroupConfig {
    pub owner_id: String,
    pub match_group_name: String,
    pub description: String,
    pub num_of_members: usize,
    #[serde(default)]
    pub department_filter: DepartmentFilter,
    #[serde(default)]
    pub office_filter: OfficeFilter,
    #[serde(default)]
    pub skill_filter: Vec<String>,
    #[serde(default)]
    pub never_matched_filter: bool,
}

impl MatchGroupConfig {
    /// True when none of the department, office or skill filters narrow the pool.
    ///
    /// `never_matched_filter` does not count: it only changes the exclusion set.
    pub fn has_active_filters(&self) -> bool {
        self.department_filter != DepartmentFilter::None
            || self.office_filter != OfficeFilter::None
            || !self.skill_filter.is_empty()
    }

    /// Number of members to draw besides the owner
    pub fn others_needed(&self) -> usize {
        self.num_of_members.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchGroupStatus {
    Open,
    Close,
}

impl MatchGroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchGroupStatus::Open => "open",
            MatchGroupStatus::Close => "close",
        }
    }
}

impl fmt::Display for MatchGroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchGroupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(MatchGroupStatus::Open),
            "close" => Ok(MatchGroupStatus::Close),
            other => Err(format!("unknown match group status: {}", other)),
        }
    }
}

/// Which match groups a read should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Open,
    #[default]
    All,
}

impl StatusFilter {
    pub fn admits(&self, status: MatchGroupStatus) -> bool {
        match self {
            StatusFilter::Open => status == MatchGroupStatus::Open,
            StatusFilter::All => true,
        }
    }
}

/// A persisted match group with its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchGroupDetail {
    pub match_group_id: String,
    pub match_group_name: String,
    pub description: String,
    pub members: Vec<User>,
    pub status: MatchGroupStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// List view of a match group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchGroup {
    pub match_group_id: String,
    pub match_group_name: String,
    pub members: Vec<User>,
    pub status: MatchGroupStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<MatchGroupDetail> for MatchGroup {
    fn from(detail: MatchGroupDetail) -> Self {
        Self {
            match_group_id: detail.match_group_id,
            match_group_name: detail.match_group_name,
            members: detail.members,
            status: detail.status,
            created_by: detail.created_by,
            created_at: detail.created_at,
        }
    }
}

/// Attribute a keyword search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchTarget {
    UserName,
    Kana,
    Mail,
    Department,
    Role,
    Office,
    Skill,
    Goal,
}

impl SearchTarget {
    pub const ALL: [SearchTarget; 8] = [
        SearchTarget::UserName,
        SearchTarget::Kana,
        SearchTarget::Mail,
        SearchTarget::Department,
        SearchTarget::Role,
        SearchTarget::Office,
        SearchTarget::Skill,
        SearchTarget::Goal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchTarget::UserName => "userName",
            SearchTarget::Kana => "kana",
            SearchTarget::Mail => "mail",
            SearchTarget::Department => "department",
            SearchTarget::Role => "role",
            SearchTarget::Office => "office",
            SearchTarget::Skill => "skill",
            SearchTarget::Goal => "goal",
        }
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchTarget::ALL
            .iter()
            .copied()
            .find(|target| target.as_str() == s)
            .ok_or_else(|| format!("unknown search target: {}", s))
    }
}

/// Set-based query over user ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserPredicate {
    /// Every user whose id is not listed
    AllExcept(Vec<String>),
    /// Users belonging to the department, optionally minus one user
    InDepartment {
        department_id: String,
        excluding: Option<String>,
    },
    /// Users belonging to any other department
    NotInDepartment { department_id: String },
    /// Users in the office, optionally minus one user
    InOffice {
        office_id: String,
        excluding: Option<String>,
    },
    /// Users in any other office
    NotInOffice { office_id: String },
    /// Users linked to at least one of the named skills
    HasAnySkill(Vec<String>),
}
