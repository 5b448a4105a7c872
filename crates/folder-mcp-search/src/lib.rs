//! Search orchestration: semantic (vector) and regex query modes over one or
//! more per-folder embedding stores.

pub mod error;
pub mod searching;

pub use error::SearchError;
pub use searching::{
    MatchContext, QueryFilters, Search, SearchMatch, SearchMode, SearchRequest, SearchScope,
    SearchService, StoreHandle,
};

/// Re-export test utilities when the `test-utils` feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_mocks {
    pub use crate::searching::test_utils::MockSearch;
}
