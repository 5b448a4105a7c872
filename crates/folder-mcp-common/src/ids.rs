//! Correlation id type for tracking one logical operation across components.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation id used to tie together log lines, progress events, and MCP
/// responses that all belong to the same logical operation.
///
/// Uses UUID v4 for guaranteed uniqueness without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn to_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Uuid::try_parse(id).map_or_else(|_| Self(Uuid::new_v4()), Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_uuid() {
        let id = CorrelationId::new();
        let uuid = id.to_uuid();
        assert_eq!(CorrelationId::from(uuid), id);
    }

    #[test]
    fn falls_back_on_invalid_string() {
        let id = CorrelationId::from("not-a-uuid");
        assert_ne!(id.to_string(), "not-a-uuid");
    }
}
