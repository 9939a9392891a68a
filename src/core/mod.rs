// Core algorithm exports
pub mod pool;
pub mod sampling;
pub mod selector;

pub use pool::{exclusion_set, filter_predicates, CandidatePool};
pub use sampling::draw_distinct;
pub use selector::MemberSelector;
