//! The `get_embedding` endpoint: generate an embedding vector for arbitrary
//! text using the active embedding provider.

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::envelope::Envelope;
use crate::mcp::{AppState, common_error_result, envelope_result, error_result};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetEmbeddingParams {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
struct GetEmbeddingResponse {
    embedding: Vec<f32>,
    token_count: usize,
}

pub async fn handler(
    state: &AppState,
    params: &GetEmbeddingParams,
) -> Result<CallToolResult, McpError> {
    if params.text.is_empty() {
        return error_result("INVALID_ARGUMENT: text must not be empty");
    }

    let embeddings = match state.embeddings.generate_embeddings(vec![params.text.as_str()]).await {
        Ok(vectors) => vectors,
        Err(e) => {
            error!(error = ?e, "embedding generation failed");
            return common_error_result(e);
        }
    };

    let Some(embedding) = embeddings.into_iter().next() else {
        return error_result("INTERNAL: embedding provider returned no vector");
    };

    let token_count = params.text.len() / 4 + 1;
    envelope_result(Envelope::success(GetEmbeddingResponse {
        embedding,
        token_count,
    }))
}
