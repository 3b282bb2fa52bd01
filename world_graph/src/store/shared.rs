//! Shared handle over the state graph for concurrent sessions.
//!
//! The store is the only mutable resource sessions share. All mutations take
//! one short writer-lock section with no external calls inside it, so two
//! sessions racing on the same fingerprint converge deterministically: one
//! wins the insert, the other observes and reuses the id.

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::fingerprint::FingerprintPolicy;
use crate::observation::Observation;
use crate::store::{EdgeResult, NodeId, StateGraph, StateNode};

/// Cloneable, thread-safe handle to one [`StateGraph`].
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<StateGraph>>,
}

impl SharedGraph {
    /// Create a handle over a fresh empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing graph (e.g. one restored from storage).
    pub fn from_graph(graph: StateGraph) -> Self {
        Self { inner: Arc::new(RwLock::new(graph)) }
    }

    /// Atomic insert-or-revisit keyed by fingerprint. See
    /// [`StateGraph::upsert_node`].
    pub fn upsert_node(
        &self,
        observation: &Observation,
        policy: &FingerprintPolicy,
        discovered_by: &str,
        at_move: u64,
    ) -> Result<(NodeId, bool)> {
        self.inner.write().upsert_node(observation, policy, discovered_by, at_move)
    }

    /// Atomic edge create-or-update. See [`StateGraph::record_transition`].
    pub fn record_transition(
        &self,
        from: &NodeId,
        action: &str,
        to: &NodeId,
        success: bool,
        reasoning: Option<&str>,
    ) -> Result<EdgeResult> {
        self.inner.write().record_transition(from, action, to, success, reasoning)
    }

    /// Run a read-only query against the graph.
    pub fn with_graph<R>(&self, f: impl FnOnce(&StateGraph) -> R) -> R {
        f(&self.inner.read())
    }

    /// Snapshot a node by id.
    pub fn node(&self, id: &NodeId) -> Option<StateNode> {
        self.inner.read().node(id).cloned()
    }

    /// Untried actions at a node.
    pub fn frontier(&self, id: &NodeId) -> BTreeSet<String> {
        self.inner.read().frontier(id)
    }

    /// Number of distinct states.
    pub fn node_count(&self) -> usize {
        self.inner.read().node_count()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.inner.read().edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn observation() -> Observation {
        Observation::at("Crossroads").with_actions(["go north", "go south"])
    }

    #[test]
    fn test_shared_upsert_and_query() {
        let graph = SharedGraph::new();
        let policy = FingerprintPolicy::default();

        let (id, novel) = graph.upsert_node(&observation(), &policy, "s1", 0).unwrap();
        assert!(novel);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.frontier(&id).len(), 2);
        assert_eq!(graph.node(&id).unwrap().description, "Crossroads");
    }

    #[test]
    fn test_concurrent_discovery_converges() {
        let graph = SharedGraph::new();
        let policy = FingerprintPolicy::default();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let graph = graph.clone();
                thread::spawn(move || {
                    let session = format!("s{i}");
                    graph.upsert_node(&observation(), &policy, &session, 0).unwrap().0
                })
            })
            .collect();

        let ids: Vec<NodeId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Exactly one node id was ever handed out.
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(&ids[0]).unwrap().visit_count, 8);
    }

    #[test]
    fn test_concurrent_edges_single_record() {
        let graph = SharedGraph::new();
        let policy = FingerprintPolicy::default();
        let (a, _) = graph.upsert_node(&observation(), &policy, "s", 0).unwrap();
        let (b, _) = graph
            .upsert_node(&Observation::at("Gate").with_action("go south"), &policy, "s", 1)
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let graph = graph.clone();
                let (a, b) = (a.clone(), b.clone());
                thread::spawn(move || {
                    graph.record_transition(&a, "go north", &b, true, None).unwrap()
                })
            })
            .collect();

        let results: Vec<EdgeResult> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.novel).count(), 1);
        assert!(results.iter().all(|r| !r.conflict));
        assert_eq!(graph.edge_count(), 1);
        graph.with_graph(|g| {
            assert_eq!(g.edge(&a, "go north").unwrap().attempts, 8);
        });
    }
}
