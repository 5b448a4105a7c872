//! The MCP tool surface: shared server state, the ten spec endpoints, and
//! schema resource exposure.

mod cellrange;
pub mod get_document_data;
pub mod get_document_outline;
pub mod get_embedding;
pub mod get_pages;
pub mod get_sheet_data;
pub mod get_slides;
pub mod get_status;
pub mod list_documents;
pub mod list_folders;
pub mod search;

use std::sync::Arc;

use agenterra_rmcp::handler::server::tool::Parameters;
use agenterra_rmcp::model::*;
use agenterra_rmcp::service::*;
use agenterra_rmcp::{Error as McpError, ServerHandler, tool};
use folder_mcp_config::AppConfig;
use folder_mcp_embeddings::EmbeddingService;
use folder_mcp_orchestrator::FolderOrchestrator;
use folder_mcp_search::SearchService;
use folder_mcp_store::{Document, EmbeddingStore};

use crate::envelope::Envelope;

/// Shared state every MCP tool handler operates on.
pub struct AppState {
    pub orchestrator: Arc<FolderOrchestrator>,
    pub search: Arc<dyn SearchService>,
    pub embeddings: Arc<dyn EmbeddingService>,
    pub config: AppConfig,
}

impl AppState {
    /// Fan out across every registered folder's store looking for
    /// `document_id`. Document ids are an opaque hash of `(folder_id, path)`
    /// with no retrievable folder id, so a single-document lookup has no
    /// shortcut over probing each store in turn.
    pub async fn find_document(
        &self,
        document_id: &str,
    ) -> Option<(String, Arc<dyn EmbeddingStore>, Document)> {
        for (folder_id, store) in self.orchestrator.all_stores() {
            if let Ok(Some(doc)) = store.get_document(document_id).await {
                return Some((folder_id, store, doc));
            }
        }
        None
    }
}

/// Converts a fully-built [`Envelope`] into the `CallToolResult` every tool
/// handler returns. Envelope construction never fails in a way that should
/// surface as a transport-level error; a serialization failure here would be
/// an internal bug, not a caller mistake.
///
/// # Errors
///
/// Returns an `McpError` only if the envelope itself cannot be serialized.
pub fn envelope_result(envelope: Envelope) -> Result<CallToolResult, McpError> {
    let content = Content::json(envelope)
        .map_err(|e| McpError::internal_error(format!("failed to serialize response: {e}"), None))?;
    Ok(CallToolResult::success(vec![content]))
}

/// Maps a business-logic error to an error envelope rather than a
/// transport-level MCP error, per the envelope's own `status.code = "error"`
/// contract (spec §7).
pub fn error_result(message: impl Into<String>) -> Result<CallToolResult, McpError> {
    envelope_result(Envelope::error(message))
}

/// Maps a crate-local error through [`folder_mcp_common::FolderMcpError`] to
/// get its status token, rather than each handler hand-rolling the literal.
pub fn common_error_message<E>(e: E) -> String
where
    E: std::fmt::Display + Into<folder_mcp_common::FolderMcpError>,
{
    let message = e.to_string();
    let status = folder_mcp_common::FolderMcpError::from(e).to_mcp_status();
    format!("{status}: {message}")
}

/// [`common_error_message`] wrapped directly into an error `CallToolResult`.
pub fn common_error_result<E>(e: E) -> Result<CallToolResult, McpError>
where
    E: std::fmt::Display + Into<folder_mcp_common::FolderMcpError>,
{
    error_result(common_error_message(e))
}

#[derive(Clone)]
pub struct McpServer {
    tool_router: agenterra_rmcp::handler::server::router::tool::ToolRouter<McpServer>,
    state: Arc<AppState>,
}

impl McpServer {
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            state,
        }
    }
}

#[agenterra_rmcp::tool_router]
impl McpServer {
    #[tool(description = "Search indexed documents by meaning (semantic) or by pattern (regex), ranked and paginated by token budget.")]
    pub async fn search(
        &self,
        Parameters(params): Parameters<search::SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        search::handler(&self.state, &params).await
    }

    #[tool(description = "Return a type-tagged outline of a document's navigable structure (pages, slides, sheets, or lines).")]
    pub async fn get_document_outline(
        &self,
        Parameters(params): Parameters<get_document_outline::GetDocumentOutlineParams>,
    ) -> Result<CallToolResult, McpError> {
        get_document_outline::handler(&self.state, &params).await
    }

    #[tool(description = "Return headers/rows for a spreadsheet document's sheet, optionally narrowed to a cell range.")]
    pub async fn get_sheet_data(
        &self,
        Parameters(params): Parameters<get_sheet_data::GetSheetDataParams>,
    ) -> Result<CallToolResult, McpError> {
        get_sheet_data::handler(&self.state, &params).await
    }

    #[tool(description = "Return content and notes for the requested slides of a presentation document.")]
    pub async fn get_slides(
        &self,
        Parameters(params): Parameters<get_slides::GetSlidesParams>,
    ) -> Result<CallToolResult, McpError> {
        get_slides::handler(&self.state, &params).await
    }

    #[tool(description = "Return content for the requested pages of a paginated document.")]
    pub async fn get_pages(
        &self,
        Parameters(params): Parameters<get_pages::GetPagesParams>,
    ) -> Result<CallToolResult, McpError> {
        get_pages::handler(&self.state, &params).await
    }

    #[tool(description = "List every folder this daemon is configured to watch and index.")]
    pub async fn list_folders(
        &self,
        Parameters(params): Parameters<list_folders::ListFoldersParams>,
    ) -> Result<CallToolResult, McpError> {
        list_folders::handler(&self.state, &params).await
    }

    #[tool(description = "List the documents indexed under one folder, paginated by token budget.")]
    pub async fn list_documents(
        &self,
        Parameters(params): Parameters<list_documents::ListDocumentsParams>,
    ) -> Result<CallToolResult, McpError> {
        list_documents::handler(&self.state, &params).await
    }

    #[tool(description = "Generate an embedding vector for arbitrary text using the active embedding provider.")]
    pub async fn get_embedding(
        &self,
        Parameters(params): Parameters<get_embedding::GetEmbeddingParams>,
    ) -> Result<CallToolResult, McpError> {
        get_embedding::handler(&self.state, &params).await
    }

    #[tool(description = "Report indexing status for one document, or the aggregate status across all folders.")]
    pub async fn get_status(
        &self,
        Parameters(params): Parameters<get_status::GetStatusParams>,
    ) -> Result<CallToolResult, McpError> {
        get_status::handler(&self.state, &params).await
    }

    #[tool(description = "Return a document's raw content, its chunks, or its parser-reported metadata.")]
    pub async fn get_document_data(
        &self,
        Parameters(params): Parameters<get_document_data::GetDocumentDataParams>,
    ) -> Result<CallToolResult, McpError> {
        get_document_data::handler(&self.state, &params).await
    }
}

const ENDPOINTS: &[&str] = &[
    "search",
    "get_document_outline",
    "get_sheet_data",
    "get_slides",
    "get_pages",
    "list_folders",
    "list_documents",
    "get_embedding",
    "get_status",
    "get_document_data",
];

#[agenterra_rmcp::tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let tools_capability = ToolsCapability {
            list_changed: Some(true),
        };
        let resources_capability = ResourcesCapability {
            list_changed: Some(true),
            ..ResourcesCapability::default()
        };

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities {
                experimental: None,
                logging: None,
                completions: None,
                prompts: None,
                resources: Some(resources_capability),
                tools: Some(tools_capability),
            },
            server_info: Implementation::from_build_env(),
            instructions: None,
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        use agenterra_rmcp::model::{Annotated, RawResource};

        let resources = ENDPOINTS
            .iter()
            .map(|name| Annotated {
                raw: RawResource {
                    uri: format!("/schema/{name}"),
                    name: (*name).to_string(),
                    description: Some(format!(
                        "JSON schema for the {name} endpoint (request/response shape, envelope)"
                    )),
                    mime_type: Some("application/json".to_string()),
                    size: None,
                },
                annotations: Default::default(),
            })
            .collect();

        std::future::ready(Ok(ListResourcesResult {
            resources,
            next_cursor: None,
        }))
    }

    /// Schemas are generated from the live Rust types via `schemars` rather
    /// than loaded from static JSON files on disk, so they can never drift
    /// from the structs that actually serialize the wire format.
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        use agenterra_rmcp::model::{ReadResourceResult, ResourceContents};

        let uri = request.uri;
        let result = (|| {
            let endpoint = uri
                .strip_prefix("/schema/")
                .ok_or_else(|| McpError::resource_not_found(format!("unknown resource URI: {uri}"), None))?;

            let schema = schema_for_endpoint(endpoint)
                .ok_or_else(|| McpError::resource_not_found(format!("schema not found for endpoint '{endpoint}'"), None))?;

            let contents = ResourceContents::text(schema, format!("/schema/{endpoint}"));
            Ok(ReadResourceResult {
                contents: vec![contents],
            })
        })();

        std::future::ready(result)
    }
}

/// Shared scaffolding for handler-level tests: a real orchestrator with one
/// folder registered against an empty temp directory (so its store exists
/// and `folder_id` is genuine), wrapped in an [`AppState`].
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use folder_mcp_config::{AppConfig, ChunkingConfig};
    use folder_mcp_embeddings::EmbeddingService;
    use folder_mcp_orchestrator::FolderOrchestrator;
    use folder_mcp_parsing::chunking::TokenCounterRegistry;
    use folder_mcp_parsing::{ChunkingService, ParserRegistry, PlainTextParser, TokenBudget};
    use folder_mcp_search::{Search, SearchService};
    use folder_mcp_test_utils::{folder_config, mock_embedding_service};

    use super::AppState;

    /// Returns the live state plus the registered folder's id. Keeps the
    /// backing temp directories alive for as long as the returned tuple is.
    pub(crate) async fn state_with_empty_folder() -> (Arc<AppState>, String, tempfile::TempDir, tempfile::TempDir) {
        let folder_dir = tempfile::tempdir().unwrap();
        let state_dir = tempfile::tempdir().unwrap();

        let mut registry = ParserRegistry::new();
        registry.register(Box::new(PlainTextParser::new()));
        let parser_registry = Arc::new(registry);

        let counter = TokenCounterRegistry::new().default_counter();
        let chunking_config = ChunkingConfig::default();
        let budget = TokenBudget::new(
            chunking_config.target_tokens,
            chunking_config.soft_cap_multiplier,
            chunking_config.hard_cap_multiplier,
        );
        let chunking_service = Arc::new(ChunkingService::new(counter, budget));
        let embeddings: Arc<dyn EmbeddingService> = mock_embedding_service();

        let orchestrator = Arc::new(FolderOrchestrator::new(
            4,
            parser_registry,
            chunking_service,
            Arc::clone(&embeddings),
            &chunking_config,
            state_dir.path().to_path_buf(),
            std::time::Duration::from_millis(20),
        ));

        let folder_id = orchestrator
            .add_folder(folder_config(folder_dir.path(), "test-folder"))
            .await
            .unwrap();

        let search: Arc<dyn SearchService> = Arc::new(Search::new(Arc::clone(&embeddings)));

        let state = Arc::new(AppState {
            orchestrator,
            search,
            embeddings,
            config: AppConfig::default(),
        });

        (state, folder_id, folder_dir, state_dir)
    }
}

fn schema_for_endpoint(endpoint: &str) -> Option<String> {
    let schema = match endpoint {
        "search" => schemars::schema_for!(search::SearchParams),
        "get_document_outline" => schemars::schema_for!(get_document_outline::GetDocumentOutlineParams),
        "get_sheet_data" => schemars::schema_for!(get_sheet_data::GetSheetDataParams),
        "get_slides" => schemars::schema_for!(get_slides::GetSlidesParams),
        "get_pages" => schemars::schema_for!(get_pages::GetPagesParams),
        "list_folders" => schemars::schema_for!(list_folders::ListFoldersParams),
        "list_documents" => schemars::schema_for!(list_documents::ListDocumentsParams),
        "get_embedding" => schemars::schema_for!(get_embedding::GetEmbeddingParams),
        "get_status" => schemars::schema_for!(get_status::GetStatusParams),
        "get_document_data" => schemars::schema_for!(get_document_data::GetDocumentDataParams),
        _ => return None,
    };
    serde_json::to_string_pretty(&schema).ok()
}
