//! Error types for world graph operations.

use thiserror::Error;

use crate::store::NodeId;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by the observation model and the state graph store.
///
/// Non-deterministic transition conflicts are deliberately *not* an error:
/// they are recorded on the edge and surfaced through audit queries.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    /// Malformed observation or action input. Rejected, never coerced.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A transition referenced a node the store has never seen.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// The backing store could not serve the request. The in-memory store
    /// never raises this; durable backends propagate their failures here.
    #[error("store unavailable: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;

    #[test]
    fn test_error_display() {
        let err = GraphError::Validation("location must not be empty".into());
        assert!(err.to_string().contains("location must not be empty"));

        let id = NodeId(Fingerprint::from_hex("ab".repeat(32)));
        assert!(GraphError::UnknownNode(id).to_string().starts_with("unknown node"));
    }
}
