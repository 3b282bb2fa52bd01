//! The exploration engine facade.
//!
//! Transport-agnostic entry point: adapters for whatever environment the
//! agent plays against call into this one type. It wires the shared graph,
//! the session tracker, the planner, and the stats aggregator together so
//! callers never juggle the pieces themselves.

use parking_lot::Mutex;

use world_graph::{Observation, SharedGraph};

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, Result};
use crate::planner::{ExplorationPlanner, PlannedAction};
use crate::session::{Session, SessionId, SessionTracker, StepResult};
use crate::stats::{GlobalStats, SessionStats, StatsAggregator};

/// Drives exploration sessions over one shared world graph.
pub struct ExplorationEngine {
    tracker: SessionTracker,
    planner: Mutex<ExplorationPlanner>,
    stats: StatsAggregator,
}

impl ExplorationEngine {
    /// Create an engine over a fresh, empty graph.
    pub fn new(config: ExplorerConfig) -> Self {
        Self::with_graph(SharedGraph::new(), config)
    }

    /// Create an engine over an existing graph, e.g. one restored from disk.
    pub fn with_graph(graph: SharedGraph, config: ExplorerConfig) -> Self {
        let planner = ExplorationPlanner::new(config.share_discoveries);
        Self {
            tracker: SessionTracker::new(graph, config),
            planner: Mutex::new(planner),
            stats: StatsAggregator::new(),
        }
    }

    /// Handle to the shared graph.
    pub fn graph(&self) -> &SharedGraph {
        self.tracker.graph()
    }

    /// Begin a playthrough at the given initial observation.
    pub fn start_session(&self, observation: &Observation) -> Result<SessionId> {
        self.tracker.start_session(observation)
    }

    /// Apply one action/observation pair to a session. When the step ends the
    /// session, any retrace state the planner held for it is dropped.
    pub fn apply_action(
        &self,
        id: SessionId,
        action: &str,
        observation: &Observation,
        success: bool,
        reasoning: Option<&str>,
    ) -> Result<StepResult> {
        let step = self.tracker.apply_action(id, action, observation, success, reasoning)?;
        if step.status.is_terminal() {
            self.planner.lock().forget_session(id);
        }
        Ok(step)
    }

    /// Ask the planner what the session should try next.
    ///
    /// Only active sessions are planned for; a terminal session gets
    /// [`ExplorerError::InvalidSessionState`].
    pub fn next_planned_action(&self, id: SessionId) -> Result<PlannedAction> {
        let session = self.tracker.session(id)?;
        if session.status.is_terminal() {
            return Err(ExplorerError::InvalidSessionState {
                session: id,
                status: session.status,
            });
        }
        Ok(self.planner.lock().next_action(&session, self.tracker.graph()))
    }

    /// Mark a session abandoned.
    pub fn abandon(&self, id: SessionId, reason: &str) -> Result<()> {
        self.tracker.abandon(id, reason)?;
        self.planner.lock().forget_session(id);
        Ok(())
    }

    /// Mark a session failed.
    pub fn fail(&self, id: SessionId, reason: &str) -> Result<()> {
        self.tracker.fail(id, reason)?;
        self.planner.lock().forget_session(id);
        Ok(())
    }

    /// Snapshot a session by id.
    pub fn session(&self, id: SessionId) -> Result<Session> {
        self.tracker.session(id)
    }

    /// Snapshot every session.
    pub fn list_sessions(&self) -> Vec<Session> {
        self.tracker.list_sessions()
    }

    /// Metrics for one session.
    pub fn session_stats(&self, id: SessionId) -> Result<SessionStats> {
        let session = self.tracker.session(id)?;
        Ok(self.stats.session_stats(self.tracker.graph(), &session))
    }

    /// Metrics across the store and all sessions.
    pub fn global_stats(&self) -> GlobalStats {
        self.stats.global_stats(self.tracker.graph(), &self.tracker.list_sessions())
    }
}
