// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    DepartmentFilter, MatchGroup, MatchGroupConfig, MatchGroupDetail, MatchGroupStatus, OfficeFilter,
    Owner, SearchTarget, SearchedUser, StatusFilter, User, UserIcon, UserPredicate,
};
pub use requests::{CreateMatchGroupRequest, MatchGroupListQuery, PageQuery, SearchQuery};
pub use responses::{ErrorResponse, HealthResponse, MatchGroupsResponse, SearchUsersResponse};
