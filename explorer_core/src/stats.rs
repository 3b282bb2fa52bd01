//! Statistics aggregation - coverage, efficiency, and path quality.
//!
//! Read-only over the store and session history; nothing here mutates either.
//! Coverage is a running estimate: the true reachable-set size is unknown
//! until exploration terminates, so the denominator is what the graph knows
//! to be reachable *today*.

use serde::{Deserialize, Serialize};

use world_graph::SharedGraph;

use crate::session::{Session, SessionId, SessionStatus};

/// Metrics for one playthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: SessionId,
    pub status: SessionStatus,

    /// Distinct nodes this session visited over nodes currently known to be
    /// reachable from its start.
    pub coverage: f64,

    /// Final score per move.
    pub efficiency: f64,

    /// Shortest known start-to-end path length over the actual path length.
    /// Only computed for completed sessions that moved at all.
    pub path_optimality: Option<f64>,

    pub nodes_visited: usize,
    pub move_count: u64,
    pub score: i64,
}

/// Metrics across the whole store and every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStats {
    pub node_count: usize,
    pub edge_count: usize,

    /// Edges flagged with multiple destinations. Data-quality signal.
    pub conflict_count: usize,

    pub total_sessions: usize,
    pub active_sessions: usize,
    pub completed_sessions: usize,

    /// Completed over total sessions.
    pub success_rate: f64,

    pub average_moves_per_session: f64,

    /// Mean per-session coverage.
    pub coverage: f64,
}

/// Derives metrics from the graph and session snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsAggregator;

impl StatsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Compute metrics for one session.
    pub fn session_stats(&self, graph: &SharedGraph, session: &Session) -> SessionStats {
        let visited = session.visited_nodes();
        let (reachable, shortest) = graph.with_graph(|g| {
            let reachable = g.reachable_from(&session.start_node).len();
            let shortest = g
                .shortest_path(&session.start_node, &session.current_node)
                .map(|path| path.len());
            (reachable, shortest)
        });

        let coverage = if reachable > 0 {
            visited.len() as f64 / reachable as f64
        } else {
            0.0
        };

        let efficiency = if session.move_count > 0 {
            session.score as f64 / session.move_count as f64
        } else {
            0.0
        };

        let path_optimality = match (session.status, shortest) {
            (SessionStatus::Completed, Some(shortest)) if session.move_count > 0 => {
                Some(shortest as f64 / session.move_count as f64)
            }
            _ => None,
        };

        SessionStats {
            session_id: session.id,
            status: session.status,
            coverage,
            efficiency,
            path_optimality,
            nodes_visited: visited.len(),
            move_count: session.move_count,
            score: session.score,
        }
    }

    /// Compute metrics across the store and all sessions.
    pub fn global_stats(&self, graph: &SharedGraph, sessions: &[Session]) -> GlobalStats {
        let (node_count, edge_count, conflict_count) = graph.with_graph(|g| {
            (g.node_count(), g.edge_count(), g.conflicted_edges().len())
        });

        let total = sessions.len();
        let active = sessions.iter().filter(|s| s.status == SessionStatus::Active).count();
        let completed = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .count();

        let success_rate = if total > 0 { completed as f64 / total as f64 } else { 0.0 };
        let average_moves = if total > 0 {
            sessions.iter().map(|s| s.move_count as f64).sum::<f64>() / total as f64
        } else {
            0.0
        };
        let coverage = if total > 0 {
            sessions
                .iter()
                .map(|s| self.session_stats(graph, s).coverage)
                .sum::<f64>()
                / total as f64
        } else {
            0.0
        };

        GlobalStats {
            node_count,
            edge_count,
            conflict_count,
            total_sessions: total,
            active_sessions: active,
            completed_sessions: completed,
            success_rate,
            average_moves_per_session: average_moves,
            coverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplorerConfig;
    use crate::session::SessionTracker;
    use world_graph::Observation;

    fn tracker() -> SessionTracker {
        SessionTracker::new(SharedGraph::new(), ExplorerConfig::default())
    }

    #[test]
    fn test_session_coverage_full_on_linear_walk() {
        let tracker = tracker();
        let id = tracker
            .start_session(&Observation::at("A").with_action("go east"))
            .unwrap();
        tracker
            .apply_action(id, "go east", &Observation::at("B").with_action("go east"), true, None)
            .unwrap();

        let stats = StatsAggregator::new().session_stats(tracker.graph(), &tracker.session(id).unwrap());
        // Visited both known-reachable nodes.
        assert_eq!(stats.nodes_visited, 2);
        assert!((stats.coverage - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_drops_as_map_grows() {
        let tracker = tracker();
        let a = Observation::at("A").with_action("go east");
        let b = Observation::at("B").with_actions(["go east", "go west"]);
        let c = Observation::at("C").with_action("go west");

        // The scout maps A-B-C.
        let scout = tracker.start_session(&a).unwrap();
        tracker.apply_action(scout, "go east", &b, true, None).unwrap();
        tracker.apply_action(scout, "go east", &c, true, None).unwrap();

        // A later session that only reaches B has seen 2 of 3 reachable nodes.
        let id = tracker.start_session(&a).unwrap();
        tracker.apply_action(id, "go east", &b, true, None).unwrap();

        let stats = StatsAggregator::new().session_stats(tracker.graph(), &tracker.session(id).unwrap());
        assert!((stats.coverage - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency() {
        let tracker = tracker();
        let id = tracker
            .start_session(&Observation::at("A").with_action("go east"))
            .unwrap();
        tracker
            .apply_action(
                id,
                "go east",
                &Observation::at("B").with_action("go west").with_score(30),
                true,
                None,
            )
            .unwrap();
        tracker
            .apply_action(
                id,
                "go west",
                &Observation::at("A").with_action("go east").with_score(30),
                true,
                None,
            )
            .unwrap();

        let stats = StatsAggregator::new().session_stats(tracker.graph(), &tracker.session(id).unwrap());
        assert!((stats.efficiency - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_path_optimality_for_completed_sessions() {
        let tracker = tracker();
        let a = Observation::at("A").with_actions(["go east", "wait"]);
        let b = Observation::at("B").with_action("go east");
        let exit = Observation::at("Exit").with_terminal(true);

        let id = tracker.start_session(&a).unwrap();
        // A wasted move, then the two useful ones: actual path length 3.
        tracker.apply_action(id, "wait", &a, true, None).unwrap();
        tracker.apply_action(id, "go east", &b, true, None).unwrap();
        tracker.apply_action(id, "go east", &exit, true, None).unwrap();

        let session = tracker.session(id).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);

        let stats = StatsAggregator::new().session_stats(tracker.graph(), &session);
        // Shortest known route is 2 moves, actual was 3.
        assert_eq!(stats.path_optimality, Some(2.0 / 3.0));
    }

    #[test]
    fn test_path_optimality_absent_for_active_sessions() {
        let tracker = tracker();
        let id = tracker
            .start_session(&Observation::at("A").with_action("go east"))
            .unwrap();
        let stats = StatsAggregator::new().session_stats(tracker.graph(), &tracker.session(id).unwrap());
        assert_eq!(stats.path_optimality, None);
    }

    #[test]
    fn test_global_stats() {
        let tracker = tracker();
        let a = Observation::at("A").with_action("go east");
        let exit = Observation::at("Exit").with_terminal(true);

        let one = tracker.start_session(&a).unwrap();
        tracker.apply_action(one, "go east", &exit, true, None).unwrap();

        let two = tracker.start_session(&a).unwrap();
        tracker.abandon(two, "operator cancel").unwrap();

        let three = tracker.start_session(&a).unwrap();

        let stats = StatsAggregator::new().global_stats(tracker.graph(), &tracker.list_sessions());
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.conflict_count, 0);
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.active_sessions, 1);
        assert_eq!(stats.completed_sessions, 1);
        assert!((stats.success_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.average_moves_per_session - 1.0 / 3.0).abs() < 1e-9);

        // Session three is still active with a frontier open.
        assert_eq!(tracker.session(three).unwrap().status, SessionStatus::Active);
    }
}
