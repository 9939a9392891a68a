use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchGroup, SearchedUser};

/// Response for the keyword search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchUsersResponse {
    pub users: Vec<SearchedUser>,
    pub total_results: usize,
}

/// Response for the match group listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchGroupsResponse {
    #[serde(rename = "matchGroups")]
    pub match_groups: Vec<MatchGroup>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }
}
