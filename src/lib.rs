//! Colleague Match - colleague search and match-group service
//!
//! This library provides the member-selection algorithm behind match groups
//! and the directory lookups around it. Storage is reached through the
//! [`services::DirectoryStore`] trait.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{draw_distinct, CandidatePool, MemberSelector};
pub use models::{MatchGroupConfig, MatchGroupDetail, Owner, SearchTarget, SearchedUser, User};
pub use services::{DirectoryStore, InMemoryStore, MatchGroupService, StoreError, UserDirectory};
