//! Token-aware chunking of parsed documents.

pub mod heuristic_counter;
pub mod model;
pub mod registry;
pub mod service;
pub mod split;
pub mod tiktoken_counter;
pub mod traits;

pub use heuristic_counter::HeuristicCounter;
pub use model::{ChunkDraft, ChunkKind, Location, SemanticMetadata};
pub use registry::TokenCounterRegistry;
pub use service::{ChunkingService, TokenBudget};
pub use tiktoken_counter::TiktokenCounter;
pub use traits::{TokenCounter, TokenCounterRef};
