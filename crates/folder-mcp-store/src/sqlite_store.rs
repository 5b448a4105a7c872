//! The SQLite-backed [`EmbeddingStore`] implementation.

use crate::error::{StoreError, StoreResult};
use crate::models::{
    Chunk, Document, DocumentStatus, FolderMeta, NewDocument, SearchFilters, SimilarityHit,
};
use crate::similarity::cosine_similarity;
use crate::vector_codec::{decode_vector, encode_vector};
use crate::{ids, pool};
use async_trait::async_trait;
use folder_mcp_parsing::chunking::{Location, SemanticMetadata};
use sqlx::{Row, SqlitePool};
use std::cmp::Ordering;
use std::path::Path;

/// Single local WAL-journalled SQLite store. Holds one connection (SQLite
/// itself serializes writers; a pool of size 1 avoids lock-contention noise
/// between in-process callers and lets every write observe the WAL
/// immediately).
pub struct SqliteEmbeddingStore {
    pool: SqlitePool,
}

impl SqliteEmbeddingStore {
    /// Open (creating if absent) the store at `path`, running migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database can't be opened or migrated.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let pool = pool::open_store(path).await?;
        Ok(Self { pool })
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Document> {
    let status: String = row.try_get("status")?;
    Ok(Document {
        id: row.try_get("id")?,
        folder_id: row.try_get("folder_id")?,
        path: row.try_get("path")?,
        content_hash: row.try_get("content_hash")?,
        size: row.try_get("size")?,
        mtime: row.try_get("mtime")?,
        status: status.parse().map_err(StoreError::NotFound)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Chunk> {
    let location_json: String = row.try_get("location_json")?;
    let semantic_json: String = row.try_get("semantic_json")?;
    let token_count: i64 = row.try_get("token_count")?;
    let ordinal: i64 = row.try_get("ordinal")?;
    Ok(Chunk {
        id: row.try_get("id")?,
        document_id: row.try_get("document_id")?,
        #[allow(clippy::cast_sign_loss)]
        ordinal: ordinal as usize,
        content: row.try_get("content")?,
        content_hash: row.try_get("content_hash")?,
        #[allow(clippy::cast_sign_loss)]
        token_count: token_count as usize,
        location: serde_json::from_str::<Location>(&location_json)?,
        semantic_metadata: serde_json::from_str::<SemanticMetadata>(&semantic_json)?,
    })
}

#[async_trait]
impl crate::traits::EmbeddingStore for SqliteEmbeddingStore {
    async fn upsert_document(&self, doc: NewDocument) -> StoreResult<Document> {
        let id = ids::document_id(&doc.folder_id, &doc.path);
        let now = Self::now();

        let existing_created_at: Option<i64> =
            sqlx::query("SELECT created_at FROM documents WHERE id = ?")
                .bind(&id)
                .fetch_optional(&self.pool)
                .await?
                .map(|r| r.get("created_at"));

        let created_at = existing_created_at.unwrap_or(now);

        sqlx::query(
            r"
            INSERT INTO documents (id, folder_id, path, content_hash, size, mtime, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                content_hash = excluded.content_hash,
                size = excluded.size,
                mtime = excluded.mtime,
                status = excluded.status,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&id)
        .bind(&doc.folder_id)
        .bind(&doc.path)
        .bind(&doc.content_hash)
        .bind(doc.size)
        .bind(doc.mtime)
        .bind(doc.status.to_string())
        .bind(created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Document {
            id,
            folder_id: doc.folder_id,
            path: doc.path,
            content_hash: doc.content_hash,
            size: doc.size,
            mtime: doc.mtime,
            status: doc.status,
            created_at,
            updated_at: now,
        })
    }

    async fn get_document(&self, document_id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query("SELECT * FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn delete_document(&self, document_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_chunks(&self, document_id: &str, chunks: Vec<Chunk>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            let location_json = serde_json::to_string(&chunk.location)?;
            let semantic_json = serde_json::to_string(&chunk.semantic_metadata)?;
            #[allow(clippy::cast_possible_wrap)]
            let ordinal = chunk.ordinal as i64;
            #[allow(clippy::cast_possible_wrap)]
            let token_count = chunk.token_count as i64;

            sqlx::query(
                r"
                INSERT INTO chunks (id, document_id, ordinal, content, content_hash, token_count, location_json, semantic_json)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(&chunk.id)
            .bind(document_id)
            .bind(ordinal)
            .bind(&chunk.content)
            .bind(&chunk.content_hash)
            .bind(token_count)
            .bind(location_json)
            .bind(semantic_json)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_embeddings(&self, rows: Vec<(String, String, Vec<f32>)>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for (chunk_id, model, vector) in rows {
            let dimension = vector.len();
            let bytes = encode_vector(&vector);
            #[allow(clippy::cast_possible_wrap)]
            let dimension_i64 = dimension as i64;

            sqlx::query(
                r"
                INSERT INTO embeddings (chunk_id, model, dimension, vector)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (chunk_id) DO UPDATE SET
                    model = excluded.model,
                    dimension = excluded.dimension,
                    vector = excluded.vector
                ",
            )
            .bind(&chunk_id)
            .bind(&model)
            .bind(dimension_i64)
            .bind(bytes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn iterate_chunks(&self, document_id: &str) -> StoreResult<Vec<Chunk>> {
        let rows = sqlx::query("SELECT * FROM chunks WHERE document_id = ? ORDER BY ordinal ASC")
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_chunk).collect()
    }

    async fn similarity_search(
        &self,
        query_vector: &[f32],
        model: &str,
        k: usize,
        filters: SearchFilters,
    ) -> StoreResult<Vec<SimilarityHit>> {
        let rows = sqlx::query(
            r"
            SELECT c.id as chunk_id, c.document_id, c.ordinal, c.content, c.location_json,
                   e.vector, d.folder_id
            FROM embeddings e
            JOIN chunks c ON c.id = e.chunk_id
            JOIN documents d ON d.id = c.document_id
            WHERE e.model = ?
            ",
        )
        .bind(model)
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<(f32, String, i64, SimilarityHit)> = Vec::new();

        for row in rows {
            let folder_id: String = row.try_get("folder_id")?;
            if let Some(wanted) = &filters.folder_id
                && &folder_id != wanted
            {
                continue;
            }
            let document_id: String = row.try_get("document_id")?;
            if let Some(wanted) = &filters.document_id
                && &document_id != wanted
            {
                continue;
            }

            let vector_bytes: Vec<u8> = row.try_get("vector")?;
            let vector = decode_vector(&vector_bytes);
            if vector.len() != query_vector.len() {
                continue;
            }
            let score = cosine_similarity(query_vector, &vector);

            let location_json: String = row.try_get("location_json")?;
            let location: Location = serde_json::from_str(&location_json)?;
            let content: String = row.try_get("content")?;
            let preview: String = content.chars().take(200).collect();
            let ordinal: i64 = row.try_get("ordinal")?;
            let chunk_id: String = row.try_get("chunk_id")?;

            scored.push((
                score,
                document_id.clone(),
                ordinal,
                SimilarityHit {
                    chunk_id,
                    document_id,
                    score,
                    location,
                    preview,
                },
            ));
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
        let row = sqlx::query("SELECT * FROM folder_meta WHERE folder_id = ?")
            .bind(folder_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(r) => FolderMeta {
                snapshot_version: r.try_get("snapshot_version")?,
                last_scan_time: r.try_get("last_scan_time")?,
                schema_version: r.try_get("schema_version")?,
            },
            None => FolderMeta::default(),
        })
    }

    async fn set_folder_meta(&self, folder_id: &str, meta: FolderMeta) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO folder_meta (folder_id, snapshot_version, last_scan_time, schema_version)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (folder_id) DO UPDATE SET
                snapshot_version = excluded.snapshot_version,
                last_scan_time = excluded.last_scan_time,
                schema_version = excluded.schema_version
            ",
        )
        .bind(folder_id)
        .bind(meta.snapshot_version)
        .bind(meta.last_scan_time)
        .bind(meta.schema_version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_documents(&self, folder_id: &str) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query("SELECT * FROM documents WHERE folder_id = ? ORDER BY path ASC")
            .bind(folder_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn close(&self) -> StoreResult<()> {
        pool::close_store(self.pool.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::EmbeddingStore;
    use folder_mcp_parsing::chunking::ChunkKind;

    async fn open_temp() -> (tempfile::TempDir, SqliteEmbeddingStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteEmbeddingStore::open(&dir.path().join("store.db"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn upsert_document_is_idempotent_under_identical_input() {
        let (_dir, store) = open_temp().await;
        let new_doc = || NewDocument {
            folder_id: "f1".into(),
            path: "a.txt".into(),
            content_hash: "h1".into(),
            size: 10,
            mtime: 100,
            status: DocumentStatus::Ready,
        };

        let first = store.upsert_document(new_doc()).await.unwrap();
        let second = store.upsert_document(new_doc()).await.unwrap();
        assert_eq!(first.id, second.id);

        let docs = store.list_documents("f1").await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn deleting_document_cascades_chunks_and_embeddings() {
        let (_dir, store) = open_temp().await;
        let doc = store
            .upsert_document(NewDocument {
                folder_id: "f1".into(),
                path: "a.txt".into(),
                content_hash: "h1".into(),
                size: 10,
                mtime: 100,
                status: DocumentStatus::Ready,
            })
            .await
            .unwrap();

        let chunk = Chunk {
            id: ids::chunk_id(&doc.id, 0),
            document_id: doc.id.clone(),
            ordinal: 0,
            content: "hello".into(),
            content_hash: "ch1".into(),
            token_count: 1,
            location: Location::Lines { start: 1, end: 1 },
            semantic_metadata: SemanticMetadata::default_for(ChunkKind::Prose),
        };
        let chunk_id = chunk.id.clone();
        store.upsert_chunks(&doc.id, vec![chunk]).await.unwrap();
        store
            .upsert_embeddings(vec![(chunk_id.clone(), "local-default".into(), vec![1.0, 0.0])])
            .await
            .unwrap();

        store.delete_document(&doc.id).await.unwrap();

        assert!(store.iterate_chunks(&doc.id).await.unwrap().is_empty());
        let hits = store
            .similarity_search(&[1.0, 0.0], "local-default", 10, SearchFilters::default())
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn similarity_search_orders_by_score_descending() {
        let (_dir, store) = open_temp().await;
        let doc = store
            .upsert_document(NewDocument {
                folder_id: "f1".into(),
                path: "a.txt".into(),
                content_hash: "h1".into(),
                size: 10,
                mtime: 100,
                status: DocumentStatus::Ready,
            })
            .await
            .unwrap();

        let chunks = vec![
            Chunk {
                id: ids::chunk_id(&doc.id, 0),
                document_id: doc.id.clone(),
                ordinal: 0,
                content: "a".into(),
                content_hash: "h0".into(),
                token_count: 1,
                location: Location::Lines { start: 1, end: 1 },
                semantic_metadata: SemanticMetadata::default_for(ChunkKind::Prose),
            },
            Chunk {
                id: ids::chunk_id(&doc.id, 1),
                document_id: doc.id.clone(),
                ordinal: 1,
                content: "b".into(),
                content_hash: "h1".into(),
                token_count: 1,
                location: Location::Lines { start: 2, end: 2 },
                semantic_metadata: SemanticMetadata::default_for(ChunkKind::Prose),
            },
        ];
        let ids = chunks.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        store.upsert_chunks(&doc.id, chunks).await.unwrap();
        store
            .upsert_embeddings(vec![
                (ids[0].clone(), "m".into(), vec![1.0, 0.0]),
                (ids[1].clone(), "m".into(), vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store
            .similarity_search(&[1.0, 0.0], "m", 10, SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, ids[0]);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn folder_meta_defaults_then_roundtrips() {
        let (_dir, store) = open_temp().await;
        assert_eq!(store.get_folder_meta("f1").await.unwrap(), FolderMeta::default());

        let meta = FolderMeta {
            snapshot_version: 3,
            last_scan_time: Some(1000),
            schema_version: 1,
        };
        store.set_folder_meta("f1", meta).await.unwrap();
        assert_eq!(store.get_folder_meta("f1").await.unwrap(), meta);
    }
}
