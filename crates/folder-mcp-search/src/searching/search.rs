//! Search service implementation: semantic (vector) and regex modes.

use super::service::{SearchService, StoreHandle};
use super::types::{MatchContext, QueryFilters, SearchMatch, SearchMode, SearchRequest, SearchScope};
use crate::error::{SearchError, SearchResult};
use async_trait::async_trait;
use folder_mcp_common::CorrelationId;
use folder_mcp_embeddings::EmbeddingService;
use folder_mcp_store::{Chunk, Document, EmbeddingStore, SearchFilters as StoreFilters};
use regex::RegexBuilder;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

/// A compiled regex pattern is rejected once its automaton would exceed
/// these byte budgets, rather than letting it run unbounded.
const REGEX_SIZE_LIMIT: usize = 1 << 20;
const REGEX_DFA_SIZE_LIMIT: usize = 1 << 20;

type SearchCache = Arc<std::sync::Mutex<lru::LruCache<String, Vec<SearchMatch>>>>;

/// Search service over one or more per-folder embedding stores. Includes
/// built-in resilience with retry logic and an in-memory result cache.
pub struct Search {
    embedding_service: Arc<dyn EmbeddingService>,
    max_retries: usize,
    retry_delay: Duration,
    search_timeout: Duration,
    cache: SearchCache,
}

impl Search {
    /// Create a search service with default retry/timeout tuning.
    #[must_use]
    pub fn new(embedding_service: Arc<dyn EmbeddingService>) -> Self {
        Self::with_retry_config(
            embedding_service,
            3,
            Duration::from_millis(100),
            Duration::from_secs(30),
        )
    }

    /// Create with custom retry configuration for production tuning.
    #[must_use]
    pub fn with_retry_config(
        embedding_service: Arc<dyn EmbeddingService>,
        max_retries: usize,
        retry_delay: Duration,
        search_timeout: Duration,
    ) -> Self {
        Self {
            embedding_service,
            max_retries,
            retry_delay,
            search_timeout,
            #[allow(clippy::unwrap_used)]
            cache: Arc::new(std::sync::Mutex::new(lru::LruCache::new(
                std::num::NonZeroUsize::new(256).unwrap(),
            ))),
        }
    }

    async fn try_search(
        &self,
        stores: &[StoreHandle],
        request: &SearchRequest,
        correlation_id: &CorrelationId,
    ) -> SearchResult<Vec<SearchMatch>> {
        tokio::time::timeout(self.search_timeout, async {
            match request.mode {
                SearchMode::Semantic => self.semantic_search(stores, request, correlation_id).await,
                SearchMode::Regex => regex_search(stores, request, correlation_id).await,
            }
        })
        .await
        .map_err(|_| SearchError::SearchTimeout {
            query: request.query.clone(),
            timeout_ms: self.search_timeout.as_millis() as u64,
            correlation_id: *correlation_id,
        })?
    }

    async fn semantic_search(
        &self,
        stores: &[StoreHandle],
        request: &SearchRequest,
        correlation_id: &CorrelationId,
    ) -> SearchResult<Vec<SearchMatch>> {
        let embeddings = self
            .embedding_service
            .generate_embeddings(vec![request.query.as_str()])
            .await?;
        let query_vector = embeddings.into_iter().next().ok_or_else(|| {
            SearchError::InvalidQuery {
                reason: "query embedding returned no vector".to_string(),
                correlation_id: *correlation_id,
            }
        })?;
        let model = self.embedding_service.provider().model_name().to_string();

        let by_folder: HashMap<&str, &Arc<dyn EmbeddingStore>> = stores
            .iter()
            .map(|(folder_id, store)| (folder_id.as_str(), store))
            .collect();

        let mut raw = Vec::new();
        for (folder_id, store) in candidate_stores(stores, &request.filters) {
            let filters = StoreFilters {
                folder_id: Some(folder_id.clone()),
                document_id: None,
            };
            let hits = store
                .similarity_search(&query_vector, &model, request.limit, filters)
                .await?;
            for hit in hits {
                raw.push((folder_id.clone(), hit));
            }
        }

        let mut matches = Vec::with_capacity(raw.len());
        for (folder_id, hit) in raw {
            let Some(store) = by_folder.get(folder_id.as_str()) else {
                continue;
            };
            let Some(document) = store.get_document(&hit.document_id).await? else {
                continue;
            };
            if !matches_file_type(&document, &request.filters) {
                continue;
            }
            let context = build_context(store, &hit.document_id, &hit.chunk_id).await?;
            matches.push(SearchMatch {
                document_id: hit.document_id,
                chunk_id: hit.chunk_id,
                folder_id,
                preview: hit.preview,
                score: hit.score,
                location: hit.location,
                context,
                document_type: document_type_of(&document),
            });
        }

        Ok(finalize(matches, request))
    }
}

#[async_trait]
impl SearchService for Search {
    async fn search(
        &self,
        stores: &[StoreHandle],
        request: &SearchRequest,
        correlation_id: &CorrelationId,
    ) -> SearchResult<Vec<SearchMatch>> {
        let cache_key = cache_key_for(stores, request);
        if let Ok(mut cache) = self.cache.lock()
            && let Some(cached) = cache.get(&cache_key)
        {
            tracing::debug!(query = %request.query, "search cache hit");
            return Ok(cached.clone());
        }

        for attempt in 0..=self.max_retries {
            match self.try_search(stores, request, correlation_id).await {
                Ok(results) => {
                    if let Ok(mut cache) = self.cache.lock() {
                        cache.put(cache_key, results.clone());
                    }
                    return Ok(results);
                }
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    let delay = self.retry_delay * 2_u32.pow(attempt as u32);
                    tracing::warn!(
                        attempt = attempt + 1,
                        ?delay,
                        error = %e,
                        "search attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("loop above always returns or errors")
    }
}

fn candidate_stores<'a>(
    stores: &'a [StoreHandle],
    filters: &QueryFilters,
) -> impl Iterator<Item = &'a StoreHandle> {
    stores.iter().filter(move |(folder_id, _)| {
        filters
            .folder_id
            .as_ref()
            .is_none_or(|wanted| wanted == folder_id)
    })
}

fn matches_file_type(document: &Document, filters: &QueryFilters) -> bool {
    filters
        .file_type
        .as_ref()
        .is_none_or(|wanted| extension_of(&document.path).eq_ignore_ascii_case(wanted))
}

fn document_type_of(document: &Document) -> String {
    extension_of(&document.path).to_string()
}

fn extension_of(path: &str) -> &str {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

async fn build_context(
    store: &Arc<dyn EmbeddingStore>,
    document_id: &str,
    chunk_id: &str,
) -> SearchResult<MatchContext> {
    let chunks = store.iterate_chunks(document_id).await?;
    let Some(index) = chunks.iter().position(|c| c.id == chunk_id) else {
        return Ok(MatchContext::default());
    };
    let before = index
        .checked_sub(1)
        .and_then(|i| chunks.get(i))
        .map(|c| c.content.clone())
        .unwrap_or_default();
    let after = chunks
        .get(index + 1)
        .map(|c| c.content.clone())
        .unwrap_or_default();
    Ok(MatchContext { before, after })
}

async fn regex_search(
    stores: &[StoreHandle],
    request: &SearchRequest,
    correlation_id: &CorrelationId,
) -> SearchResult<Vec<SearchMatch>> {
    let re = RegexBuilder::new(&request.query)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_DFA_SIZE_LIMIT)
        .build()
        .map_err(|e| match e {
            regex::Error::CompiledTooBig(_) => SearchError::PatternTooExpensive {
                reason: e.to_string(),
                correlation_id: *correlation_id,
            },
            other => SearchError::InvalidQuery {
                reason: other.to_string(),
                correlation_id: *correlation_id,
            },
        })?;

    let mut matches = Vec::new();
    for (folder_id, store) in candidate_stores(stores, &request.filters) {
        let documents = store.list_documents(folder_id).await?;
        for document in documents {
            if !matches_file_type(&document, &request.filters) {
                continue;
            }
            let chunks = store.iterate_chunks(&document.id).await?;
            if let Some(found) = scan_document(store, folder_id, &document, &chunks, &re, request.scope).await? {
                matches.extend(found);
            }
        }
    }
    Ok(finalize(matches, request))
}

async fn scan_document(
    store: &Arc<dyn EmbeddingStore>,
    folder_id: &str,
    document: &Document,
    chunks: &[Chunk],
    re: &regex::Regex,
    scope: SearchScope,
) -> SearchResult<Option<Vec<SearchMatch>>> {
    let mut found = Vec::new();
    for chunk in chunks {
        let Some(m) = re.find(&chunk.content) else {
            continue;
        };
        let context = build_context(store, &document.id, &chunk.id).await?;
        found.push(SearchMatch {
            document_id: document.id.clone(),
            chunk_id: chunk.id.clone(),
            folder_id: folder_id.to_string(),
            preview: m.as_str().chars().take(200).collect(),
            score: 1.0,
            location: chunk.location.clone(),
            context,
            document_type: document_type_of(document),
        });
        if scope == SearchScope::Documents {
            break;
        }
    }
    if found.is_empty() {
        Ok(None)
    } else {
        Ok(Some(found))
    }
}

fn finalize(mut matches: Vec<SearchMatch>, request: &SearchRequest) -> Vec<SearchMatch> {
    if request.scope == SearchScope::Documents {
        let mut best: HashMap<String, SearchMatch> = HashMap::new();
        for m in matches {
            best.entry(m.document_id.clone())
                .and_modify(|existing| {
                    if m.score > existing.score {
                        *existing = m.clone();
                    }
                })
                .or_insert(m);
        }
        matches = best.into_values().collect();
    }

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
    matches.truncate(request.limit);
    matches
}

fn cache_key_for(stores: &[StoreHandle], request: &SearchRequest) -> String {
    let mut folder_ids: Vec<&str> = stores.iter().map(|(id, _)| id.as_str()).collect();
    folder_ids.sort_unstable();
    format!(
        "{:?}:{:?}:{}:{}:{}:{}:{}",
        request.mode,
        request.scope,
        request.filters.folder_id.as_deref().unwrap_or("all"),
        request.filters.file_type.as_deref().unwrap_or("any"),
        request.query,
        request.limit,
        folder_ids.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use folder_mcp_parsing::chunking::{ChunkKind, Location, SemanticMetadata};
    use folder_mcp_store::MockEmbeddingStore;

    fn chunk(id: &str, document_id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: document_id.to_string(),
            ordinal: 0,
            content: content.to_string(),
            content_hash: "h".to_string(),
            token_count: 1,
            location: Location::Lines { start: 1, end: 1 },
            semantic_metadata: SemanticMetadata::default_for(ChunkKind::Prose),
        }
    }

    #[test]
    fn extension_of_handles_no_extension() {
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of("notes/a.md"), "md");
    }

    #[tokio::test]
    async fn build_context_returns_neighbors() {
        let store = MockEmbeddingStore::new();
        let store: Arc<dyn EmbeddingStore> = Arc::new(store);
        store
            .upsert_chunks(
                "doc-1",
                vec![
                    chunk("c0", "doc-1", "first"),
                    chunk("c1", "doc-1", "middle"),
                    chunk("c2", "doc-1", "last"),
                ],
            )
            .await
            .unwrap();

        let ctx = build_context(&store, "doc-1", "c1").await.unwrap();
        assert_eq!(ctx.before, "first");
        assert_eq!(ctx.after, "last");
    }
}
