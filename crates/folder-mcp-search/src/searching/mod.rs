//! Search service module: query types and the semantic/regex implementation.

pub mod search;
pub mod service;
pub mod types;

pub use search::Search;
pub use service::{SearchService, StoreHandle};
pub use types::{MatchContext, QueryFilters, SearchMatch, SearchMode, SearchRequest, SearchScope};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
