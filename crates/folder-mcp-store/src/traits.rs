//! The embedding store's capability contract.

use crate::error::StoreResult;
use crate::models::{Chunk, Document, FolderMeta, NewDocument, SearchFilters, SimilarityHit};
use async_trait::async_trait;

/// Persists documents, chunks, and embeddings for one or more folders, and
/// answers similarity and metadata queries. The sole writer of persisted
/// rows; callers reach it only through these typed operations.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Insert or update a document. Returns the stored row, including its
    /// derived id.
    async fn upsert_document(&self, doc: NewDocument) -> StoreResult<Document>;

    /// Fetch a document's metadata-only outline (no chunk content).
    async fn get_document(&self, document_id: &str) -> StoreResult<Option<Document>>;

    /// Delete a document and cascade-delete its chunks and embeddings.
    async fn delete_document(&self, document_id: &str) -> StoreResult<()>;

    /// Atomically replace all chunks for a document with `chunks`, in one
    /// transaction. Chunks are assumed to already carry their final ids.
    async fn upsert_chunks(&self, document_id: &str, chunks: Vec<Chunk>) -> StoreResult<()>;

    /// Upsert one embedding per `(chunk_id, model)`. Rejects any embedding
    /// whose chunk row doesn't exist.
    async fn upsert_embeddings(
        &self,
        rows: Vec<(String, String, Vec<f32>)>,
    ) -> StoreResult<()>;

    /// Restartable, ordinal-ordered iteration over a document's chunks.
    async fn iterate_chunks(&self, document_id: &str) -> StoreResult<Vec<Chunk>>;

    /// Brute-force cosine similarity search over stored embeddings for the
    /// given model, highest score first, ties broken by
    /// `(document_id, ordinal)` ascending.
    async fn similarity_search(
        &self,
        query_vector: &[f32],
        model: &str,
        k: usize,
        filters: SearchFilters,
    ) -> StoreResult<Vec<SimilarityHit>>;

    /// Read or initialize a folder's bookkeeping row.
    async fn get_folder_meta(&self, folder_id: &str) -> StoreResult<FolderMeta>;

    /// Persist a folder's bookkeeping row.
    async fn set_folder_meta(&self, folder_id: &str, meta: FolderMeta) -> StoreResult<()>;

    /// List document ids and paths for a folder, for `list_documents`.
    async fn list_documents(&self, folder_id: &str) -> StoreResult<Vec<Document>>;

    /// Drain pending writes, checkpoint the WAL, and release all handles.
    /// Must be called before the owning process exits or a folder is removed.
    async fn close(&self) -> StoreResult<()>;
}
