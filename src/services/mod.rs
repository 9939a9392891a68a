// Service exports
pub mod match_groups;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod users;

pub use match_groups::{MatchGroupError, MatchGroupService};
pub use memory::{InMemoryStore, MemberRecord};
pub use postgres::PostgresClient;
pub use store::{DirectoryStore, MatchGroupRecord, StoreError};
pub use users::UserDirectory;
