//! In-memory [`EmbeddingStore`] for unit tests of callers that don't need a
//! real SQLite file (orchestrator/search tests).

use crate::error::StoreResult;
use crate::ids;
use crate::models::{
    Chunk, Document, FolderMeta, NewDocument, SearchFilters, SimilarityHit,
};
use crate::similarity::cosine_similarity;
use crate::traits::EmbeddingStore;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    documents: HashMap<String, Document>,
    chunks: HashMap<String, Vec<Chunk>>,
    embeddings: HashMap<(String, String), Vec<f32>>,
    folder_meta: HashMap<String, FolderMeta>,
}

/// An in-memory store with the same semantics as
/// [`crate::SqliteEmbeddingStore`], for tests that want a real
/// `EmbeddingStore` without touching disk.
#[derive(Default)]
pub struct MockEmbeddingStore {
    state: Mutex<State>,
}

impl MockEmbeddingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmbeddingStore for MockEmbeddingStore {
    async fn upsert_document(&self, doc: NewDocument) -> StoreResult<Document> {
        let id = ids::document_id(&doc.folder_id, &doc.path);
        let mut state = self.state.lock().unwrap();
        let created_at = state.documents.get(&id).map_or(0, |d| d.created_at);
        let record = Document {
            id: id.clone(),
            folder_id: doc.folder_id,
            path: doc.path,
            content_hash: doc.content_hash,
            size: doc.size,
            mtime: doc.mtime,
            status: doc.status,
            created_at,
            updated_at: created_at + 1,
        };
        state.documents.insert(id, record.clone());
        Ok(record)
    }

    async fn get_document(&self, document_id: &str) -> StoreResult<Option<Document>> {
        Ok(self.state.lock().unwrap().documents.get(document_id).cloned())
    }

    async fn delete_document(&self, document_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.documents.remove(document_id);
        if let Some(removed) = state.chunks.remove(document_id) {
            for chunk in removed {
                state.embeddings.retain(|(chunk_id, _), _| chunk_id != &chunk.id);
            }
        }
        Ok(())
    }

    async fn upsert_chunks(&self, document_id: &str, chunks: Vec<Chunk>) -> StoreResult<()> {
        self.state
            .lock()
            .unwrap()
            .chunks
            .insert(document_id.to_string(), chunks);
        Ok(())
    }

    async fn upsert_embeddings(&self, rows: Vec<(String, String, Vec<f32>)>) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        for (chunk_id, model, vector) in rows {
            state.embeddings.insert((chunk_id, model), vector);
        }
        Ok(())
    }

    async fn iterate_chunks(&self, document_id: &str) -> StoreResult<Vec<Chunk>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .chunks
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn similarity_search(
        &self,
        query_vector: &[f32],
        model: &str,
        k: usize,
        filters: SearchFilters,
    ) -> StoreResult<Vec<SimilarityHit>> {
        let state = self.state.lock().unwrap();
        let mut scored: Vec<(f32, String, usize, SimilarityHit)> = Vec::new();

        for (document_id, chunks) in &state.chunks {
            if let Some(wanted) = &filters.document_id
                && document_id != wanted
            {
                continue;
            }
            let Some(doc) = state.documents.get(document_id) else {
                continue;
            };
            if let Some(wanted) = &filters.folder_id
                && &doc.folder_id != wanted
            {
                continue;
            }

            for chunk in chunks {
                let Some(vector) = state.embeddings.get(&(chunk.id.clone(), model.to_string()))
                else {
                    continue;
                };
                if vector.len() != query_vector.len() {
                    continue;
                }
                let score = cosine_similarity(query_vector, vector);
                scored.push((
                    score,
                    document_id.clone(),
                    chunk.ordinal,
                    SimilarityHit {
                        chunk_id: chunk.id.clone(),
                        document_id: document_id.clone(),
                        score,
                        location: chunk.location.clone(),
                        preview: chunk.content.chars().take(200).collect(),
                    },
                ));
            }
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        Ok(scored.into_iter().take(k).map(|(_, _, _, hit)| hit).collect())
    }

    async fn get_folder_meta(&self, folder_id: &str) -> StoreResult<FolderMeta> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .folder_meta
            .get(folder_id)
            .copied()
            .unwrap_or_default())
    }

    async fn set_folder_meta(&self, folder_id: &str, meta: FolderMeta) -> StoreResult<()> {
        self.state
            .lock()
            .unwrap()
            .folder_meta
            .insert(folder_id.to_string(), meta);
        Ok(())
    }

    async fn list_documents(&self, folder_id: &str) -> StoreResult<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .state
            .lock()
            .unwrap()
            .documents
            .values()
            .filter(|d| d.folder_id == folder_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(docs)
    }

    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentStatus;

    #[tokio::test]
    async fn round_trips_a_document() {
        let store = MockEmbeddingStore::new();
        let doc = store
            .upsert_document(NewDocument {
                folder_id: "f1".into(),
                path: "a.txt".into(),
                content_hash: "h".into(),
                size: 1,
                mtime: 1,
                status: DocumentStatus::Ready,
            })
            .await
            .unwrap();
        assert_eq!(store.get_document(&doc.id).await.unwrap(), Some(doc));
    }
}
