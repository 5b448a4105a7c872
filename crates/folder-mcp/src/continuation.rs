//! Continuation tokens: opaque, self-describing cursors for paginated
//! endpoints. Encoded as base64url(JSON) of `{endpoint, document_id?, cursor,
//! version}`; the server re-validates every field on the way back in.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// The schema version stamped into every token this build issues. Bumping it
/// invalidates tokens minted by older builds instead of silently
/// misinterpreting their cursor.
pub const TOKEN_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub document_id: Option<String>,
    pub cursor: usize,
    pub version: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ContinuationError {
    #[error("malformed continuation token")]
    Malformed,

    #[error("continuation token is for endpoint '{expected}', got '{actual}'")]
    WrongEndpoint { expected: String, actual: String },

    #[error("continuation token document id mismatch")]
    WrongDocument,

    #[error("continuation token version {0} is not supported")]
    UnsupportedVersion(u32),
}

impl ContinuationToken {
    #[must_use]
    pub fn new(endpoint: &str, document_id: Option<String>, cursor: usize) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            document_id,
            cursor,
            version: TOKEN_VERSION,
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode and validate `token` against the endpoint (and, if given, the
    /// document id) the caller expects.
    ///
    /// # Errors
    ///
    /// Returns [`ContinuationError`] if the token is malformed, stamped with
    /// an unsupported version, or was issued for a different endpoint or
    /// document.
    pub fn decode(
        token: &str,
        expected_endpoint: &str,
        expected_document_id: Option<&str>,
    ) -> Result<Self, ContinuationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| ContinuationError::Malformed)?;
        let parsed: Self =
            serde_json::from_slice(&bytes).map_err(|_| ContinuationError::Malformed)?;

        if parsed.version != TOKEN_VERSION {
            return Err(ContinuationError::UnsupportedVersion(parsed.version));
        }
        if parsed.endpoint != expected_endpoint {
            return Err(ContinuationError::WrongEndpoint {
                expected: expected_endpoint.to_string(),
                actual: parsed.endpoint,
            });
        }
        if let Some(expected_id) = expected_document_id
            && parsed.document_id.as_deref() != Some(expected_id)
        {
            return Err(ContinuationError::WrongDocument);
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_encode_decode() {
        let token = ContinuationToken::new("list_documents", None, 42);
        let encoded = token.encode();
        let decoded = ContinuationToken::decode(&encoded, "list_documents", None).unwrap();
        assert_eq!(decoded.cursor, 42);
    }

    #[test]
    fn rejects_mismatched_endpoint() {
        let token = ContinuationToken::new("list_documents", None, 0);
        let encoded = token.encode();
        let err = ContinuationToken::decode(&encoded, "search", None).unwrap_err();
        assert!(matches!(err, ContinuationError::WrongEndpoint { .. }));
    }

    #[test]
    fn rejects_malformed_token() {
        let err = ContinuationToken::decode("not-valid-base64!!", "search", None).unwrap_err();
        assert!(matches!(err, ContinuationError::Malformed));
    }

    #[test]
    fn rejects_document_id_mismatch() {
        let token = ContinuationToken::new("get_sheet_data", Some("doc-1".to_string()), 0);
        let encoded = token.encode();
        let err = ContinuationToken::decode(&encoded, "get_sheet_data", Some("doc-2")).unwrap_err();
        assert!(matches!(err, ContinuationError::WrongDocument));
    }
}
