//! Error types for session tracking and planning.

use thiserror::Error;

use crate::session::{SessionId, SessionStatus};

/// Result type alias for explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Errors raised while driving sessions over the world graph.
#[derive(Error, Debug, Clone)]
pub enum ExplorerError {
    /// Underlying graph store rejected the operation.
    #[error("graph error: {0}")]
    Graph(#[from] world_graph::GraphError),

    /// The session id is not known to the tracker.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Mutation attempted on a session whose status is absorbing.
    #[error("session {session} is {status:?}; only active sessions accept actions")]
    InvalidSessionState {
        session: SessionId,
        status: SessionStatus,
    },

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_converts() {
        let graph_err = world_graph::GraphError::Validation("bad".into());
        let err: ExplorerError = graph_err.into();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = ExplorerError::InvalidSessionState {
            session: SessionId::new(),
            status: SessionStatus::Completed,
        };
        assert!(err.to_string().contains("Completed"));
    }
}
