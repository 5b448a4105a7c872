//! The embedding store: one local, WAL-journalled SQLite database per
//! folder holding documents, chunks, and embeddings, with brute-force
//! cosine similarity search.

pub mod error;
pub mod ids;
pub mod mock;
pub mod models;
pub mod pool;
pub mod similarity;
pub mod sqlite_store;
pub mod traits;
pub mod vector_codec;

pub use error::{StoreError, StoreResult};
pub use mock::MockEmbeddingStore;
pub use models::{
    Chunk, Document, DocumentStatus, FolderMeta, NewDocument, SearchFilters, SimilarityHit,
};
pub use sqlite_store::SqliteEmbeddingStore;
pub use traits::EmbeddingStore;
