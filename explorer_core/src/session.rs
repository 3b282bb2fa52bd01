//! Session tracking - per-playthrough cursors over the shared world graph.
//!
//! Sessions hold node ids only, never graph data, so a discovery made by one
//! playthrough is immediately visible to every other. A session's own `path`
//! is the literal trace of what it did; the global graph is what the world
//! looks like.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use world_graph::{NodeId, Observation, SharedGraph};

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, Result};

/// Unique identifier for sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a session. Everything but `Active` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    /// The environment reported a terminal state.
    Completed,
    /// An agent or adapter error ended the playthrough.
    Failed,
    /// Operator cancellation or an external cap.
    Abandoned,
}

impl SessionStatus {
    /// Whether the status accepts no further mutation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// One step of a session's literal trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub from: NodeId,
    pub action: String,
    pub to: NodeId,
    pub success: bool,
}

/// One playthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub status: SessionStatus,

    /// Node the playthrough started at.
    pub start_node: NodeId,

    /// Node the cursor currently sits on.
    pub current_node: NodeId,

    /// Ordered playthrough trace. Multiple sessions may retrace the same
    /// global edge; each keeps its own steps.
    pub path: Vec<PathStep>,

    pub move_count: u64,
    pub score: i64,
    pub victory: bool,

    /// Why the session was abandoned or failed, when it was.
    pub end_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(id: SessionId, start_node: NodeId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: SessionStatus::Active,
            current_node: start_node.clone(),
            start_node,
            path: Vec::new(),
            move_count: 0,
            score: 0,
            victory: false,
            end_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Distinct nodes this session has stood on, including the start.
    pub fn visited_nodes(&self) -> std::collections::HashSet<NodeId> {
        let mut visited = std::collections::HashSet::new();
        visited.insert(self.start_node.clone());
        for step in &self.path {
            visited.insert(step.to.clone());
        }
        visited
    }
}

/// Result of applying one action to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Node the session landed on.
    pub node_id: NodeId,

    /// First global observation of this exact transition.
    pub novel: bool,

    /// Untried actions remaining at the landing node.
    pub frontier_size: usize,

    pub status: SessionStatus,
}

/// Tracks all playthroughs over one shared graph.
///
/// Session state lives behind its own lock, separate from the graph's, and
/// graph mutations never run while the session map is held. `abandon` is safe
/// to call concurrently with an in-flight `apply_action`: the in-flight step
/// is still appended (its transition already happened in the environment),
/// with last-writer-wins on status only.
pub struct SessionTracker {
    graph: SharedGraph,
    config: ExplorerConfig,
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionTracker {
    /// Create a tracker over the given graph handle.
    pub fn new(graph: SharedGraph, config: ExplorerConfig) -> Self {
        Self {
            graph,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Handle to the shared graph this tracker writes into.
    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// Begin a playthrough at the given initial observation.
    pub fn start_session(&self, observation: &Observation) -> Result<SessionId> {
        let id = SessionId::new();

        // Upsert first so a validation error never creates a session.
        let (node_id, _) = self
            .graph
            .upsert_node(observation, &self.config.fingerprint, &id.to_string(), 0)?;

        let mut session = Session::new(id, node_id);
        session.score = observation.score;
        self.sessions.write().insert(id, session);

        tracing::info!(session = %id, "session started");
        Ok(id)
    }

    /// Apply one action/observation pair to a session.
    ///
    /// Fingerprints and upserts the resulting state, records the transition
    /// from the session's current node, appends the trace step, and advances
    /// the cursor. Terminal observations complete the session; the configured
    /// move cap abandons it.
    pub fn apply_action(
        &self,
        id: SessionId,
        action: &str,
        observation: &Observation,
        success: bool,
        reasoning: Option<&str>,
    ) -> Result<StepResult> {
        // Snapshot the cursor without holding the map across graph calls.
        let (from, at_move) = {
            let sessions = self.sessions.read();
            let session = sessions.get(&id).ok_or(ExplorerError::SessionNotFound(id))?;
            if session.status.is_terminal() {
                return Err(ExplorerError::InvalidSessionState {
                    session: id,
                    status: session.status,
                });
            }
            (session.current_node.clone(), session.move_count + 1)
        };

        let (to, _) = self
            .graph
            .upsert_node(observation, &self.config.fingerprint, &id.to_string(), at_move)?;
        let edge = self.graph.record_transition(&from, action, &to, success, reasoning)?;
        let frontier_size = self.graph.frontier(&to).len();

        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&id).ok_or(ExplorerError::SessionNotFound(id))?;

        // An abandon may have landed while the environment round-trip was in
        // flight; the step still happened, so it is appended either way.
        session.path.push(PathStep {
            from,
            action: action.to_string(),
            to: to.clone(),
            success,
        });
        session.current_node = to.clone();
        session.move_count += 1;
        session.score = observation.score;

        if session.status == SessionStatus::Active {
            if observation.terminal {
                session.status = SessionStatus::Completed;
                session.victory = observation.victory;
                tracing::info!(session = %id, victory = observation.victory, "session completed");
            } else if session.move_count >= self.config.max_moves {
                session.status = SessionStatus::Abandoned;
                session.end_reason = Some(format!("move cap of {} reached", self.config.max_moves));
                tracing::warn!(session = %id, cap = self.config.max_moves, "session hit move cap");
            }
        }
        session.touch();

        Ok(StepResult {
            node_id: to,
            novel: edge.novel,
            frontier_size,
            status: session.status,
        })
    }

    /// Mark a session abandoned. Immediate, non-blocking, and a no-op when
    /// the session is already in a terminal status.
    pub fn abandon(&self, id: SessionId, reason: &str) -> Result<()> {
        self.end_session(id, SessionStatus::Abandoned, reason)
    }

    /// Mark a session failed due to an agent or adapter error.
    pub fn fail(&self, id: SessionId, reason: &str) -> Result<()> {
        self.end_session(id, SessionStatus::Failed, reason)
    }

    fn end_session(&self, id: SessionId, status: SessionStatus, reason: &str) -> Result<()> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&id).ok_or(ExplorerError::SessionNotFound(id))?;
        if session.status.is_terminal() {
            return Ok(());
        }
        session.status = status;
        session.end_reason = Some(reason.to_string());
        session.touch();
        tracing::info!(session = %id, ?status, reason, "session ended");
        Ok(())
    }

    /// Snapshot a session by id.
    pub fn session(&self, id: SessionId) -> Result<Session> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(ExplorerError::SessionNotFound(id))
    }

    /// Snapshot every session.
    pub fn list_sessions(&self) -> Vec<Session> {
        self.sessions.read().values().cloned().collect()
    }

    /// Number of sessions still accepting actions.
    pub fn active_session_count(&self) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|s| s.status == SessionStatus::Active)
            .count()
    }
}
