//! State graph store - the deduplicated map of distinct world-states.
//!
//! The graph stores nodes (unique fingerprinted states) and labeled edges
//! (action transitions between them). Edges are plain id pairs held in
//! adjacency maps, never object pointers, so cycles need no special handling
//! and the whole structure serializes as-is. Nodes are append-only for the
//! lifetime of the store.

mod shared;

pub use shared::*;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::error::{GraphError, Result};
use crate::fingerprint::{Fingerprint, FingerprintPolicy};
use crate::observation::Observation;

/// Unique identifier for state nodes, derived from the state fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Fingerprint);

impl NodeId {
    /// Abbreviated id for logs.
    pub fn short(&self) -> &str {
        self.0.short()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One distinct world configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateNode {
    pub id: NodeId,

    /// Text snapshot captured at first discovery. Later discoveries of the
    /// same fingerprint never overwrite it.
    pub description: String,

    /// Union of every action set observed at this fingerprint.
    pub available_actions: BTreeSet<String>,

    /// Last observed score. Mutable attribute, not part of identity.
    pub score: i64,

    pub terminal: bool,
    pub victory: bool,

    /// How many times any session has landed here.
    pub visit_count: u64,

    /// Session that first discovered this state.
    pub first_discovered_by: String,

    /// Move number within the discovering session.
    pub first_discovered_at_move: u64,
}

impl StateNode {
    fn from_observation(
        id: NodeId,
        observation: &Observation,
        discovered_by: &str,
        at_move: u64,
    ) -> Self {
        Self {
            id,
            description: observation.location.clone(),
            available_actions: observation.canonical_actions(),
            score: observation.score,
            terminal: observation.terminal,
            victory: observation.victory,
            visit_count: 1,
            first_discovered_by: discovered_by.to_string(),
            first_discovered_at_move: at_move,
        }
    }

    /// Fold a repeat observation of this fingerprint into the node: union the
    /// action set, refresh mutable attributes, bump the visit counter.
    fn absorb(&mut self, observation: &Observation) {
        self.available_actions.extend(observation.canonical_actions());
        self.score = observation.score;
        self.terminal |= observation.terminal;
        self.victory |= observation.victory;
        self.visit_count += 1;
    }
}

/// A directed, labeled transition `(from, action) -> destination(s)`.
///
/// Exactly one edge exists per `(from, action)` pair. A second destination for
/// the same pair means the environment behaved non-deterministically; the edge
/// keeps every destination in observation order and carries a conflict flag
/// rather than overwriting history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEdge {
    pub from: NodeId,
    pub action: String,

    /// Destinations in first-observed order. More than one entry marks a
    /// non-determinism conflict.
    pub destinations: Vec<NodeId>,

    /// Times this exact action was tried from `from`.
    pub attempts: u64,

    pub success_count: u64,
    pub failure_count: u64,

    /// Free-text rationale from the decision-maker. Audit only.
    pub last_reasoning: Option<String>,
}

impl TransitionEdge {
    fn new(from: NodeId, action: String, to: NodeId) -> Self {
        Self {
            from,
            action,
            destinations: vec![to],
            attempts: 0,
            success_count: 0,
            failure_count: 0,
            last_reasoning: None,
        }
    }

    /// Whether this edge has been observed leading to more than one state.
    pub fn is_conflicted(&self) -> bool {
        self.destinations.len() > 1
    }

    /// The first-observed destination, used for deterministic pathing.
    pub fn primary_destination(&self) -> &NodeId {
        &self.destinations[0]
    }

    fn record(&mut self, to: &NodeId, success: bool, reasoning: Option<&str>) -> bool {
        self.attempts += 1;
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        if let Some(text) = reasoning {
            self.last_reasoning = Some(text.to_string());
        }

        if self.destinations.contains(to) {
            false
        } else {
            self.destinations.push(to.clone());
            true
        }
    }
}

/// Outcome of recording a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeResult {
    /// First time this exact `(from, action) -> to` transition was observed.
    pub novel: bool,

    /// The edge now has multiple destinations.
    pub conflict: bool,
}

/// The deduplicated state graph.
///
/// Plain single-writer structure; [`SharedGraph`] wraps it for concurrent
/// sessions. Lookups are hash-indexed, per-node edge maps are ordered so that
/// frontier and neighbor listings are deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateGraph {
    /// All known states by id.
    nodes: HashMap<NodeId, StateNode>,

    /// Adjacency: node -> action -> edge.
    edges: HashMap<NodeId, BTreeMap<String, TransitionEdge>>,

    /// Running edge total, maintained on insert.
    edge_count: usize,
}

impl StateGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or revisit the state described by `observation`.
    ///
    /// Returns the node id and whether the node is new to the graph. Known
    /// fingerprints absorb the observation (action-set union, visit count);
    /// the canonical description from first discovery is preserved.
    pub fn upsert_node(
        &mut self,
        observation: &Observation,
        policy: &FingerprintPolicy,
        discovered_by: &str,
        at_move: u64,
    ) -> Result<(NodeId, bool)> {
        observation.validate()?;

        let id = NodeId(Fingerprint::of(observation, policy));
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.absorb(observation);
                Ok((id, false))
            }
            None => {
                let node = StateNode::from_observation(id.clone(), observation, discovered_by, at_move);
                tracing::debug!(node = %id.short(), location = %observation.location, "new state discovered");
                self.nodes.insert(id.clone(), node);
                Ok((id, true))
            }
        }
    }

    /// Record that `action` taken from `from` led to `to`.
    ///
    /// Creates the edge on first observation, otherwise increments its
    /// counters. A destination that differs from every previous one flags a
    /// non-determinism conflict on the edge instead of overwriting it.
    pub fn record_transition(
        &mut self,
        from: &NodeId,
        action: &str,
        to: &NodeId,
        success: bool,
        reasoning: Option<&str>,
    ) -> Result<EdgeResult> {
        let action = crate::observation::canonical_text(action);
        if action.is_empty() {
            return Err(GraphError::Validation("action must not be blank".into()));
        }
        if !self.nodes.contains_key(from) {
            return Err(GraphError::UnknownNode(from.clone()));
        }
        if !self.nodes.contains_key(to) {
            return Err(GraphError::UnknownNode(to.clone()));
        }

        let outgoing = self.edges.entry(from.clone()).or_default();
        match outgoing.get_mut(&action) {
            Some(edge) => {
                let new_destination = edge.record(to, success, reasoning);
                if new_destination {
                    tracing::warn!(
                        from = %from.short(),
                        action = %action,
                        to = %to.short(),
                        "non-deterministic transition: edge now has multiple destinations"
                    );
                }
                Ok(EdgeResult {
                    novel: new_destination,
                    conflict: edge.is_conflicted(),
                })
            }
            None => {
                let mut edge = TransitionEdge::new(from.clone(), action.clone(), to.clone());
                edge.record(to, success, reasoning);
                outgoing.insert(action.clone(), edge);
                self.edge_count += 1;
                tracing::debug!(from = %from.short(), action = %action, to = %to.short(), "new transition");
                Ok(EdgeResult { novel: true, conflict: false })
            }
        }
    }

    /// Get a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&StateNode> {
        self.nodes.get(id)
    }

    /// Get the edge for `(from, action)`, if recorded.
    pub fn edge(&self, from: &NodeId, action: &str) -> Option<&TransitionEdge> {
        self.edges.get(from)?.get(action)
    }

    /// Recorded outgoing transitions of a node as `(action, primary destination)`,
    /// in action order.
    pub fn neighbors(&self, id: &NodeId) -> Vec<(String, NodeId)> {
        self.edges
            .get(id)
            .map(|outgoing| {
                outgoing
                    .iter()
                    .map(|(action, edge)| (action.clone(), edge.primary_destination().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Untried actions at a node: available actions minus those with a
    /// recorded edge. Empty for unknown nodes.
    pub fn frontier(&self, id: &NodeId) -> BTreeSet<String> {
        let Some(node) = self.nodes.get(id) else {
            return BTreeSet::new();
        };
        let tried = self.edges.get(id);
        node.available_actions
            .iter()
            .filter(|action| tried.map_or(true, |edges| !edges.contains_key(*action)))
            .cloned()
            .collect()
    }

    /// All nodes reported terminal by the environment.
    pub fn terminal_nodes(&self) -> Vec<&StateNode> {
        self.nodes.values().filter(|n| n.terminal).collect()
    }

    /// All nodes reported as victories.
    pub fn victory_nodes(&self) -> Vec<&StateNode> {
        self.nodes.values().filter(|n| n.victory).collect()
    }

    /// Every edge flagged with multiple destinations, for audit.
    pub fn conflicted_edges(&self) -> Vec<&TransitionEdge> {
        self.edges
            .values()
            .flat_map(|outgoing| outgoing.values())
            .filter(|edge| edge.is_conflicted())
            .collect()
    }

    /// Iterate over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.values()
    }

    /// Number of distinct states.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct `(from, action)` edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Every node reachable from `start` through recorded edges, including
    /// all destinations of conflicted edges. Includes `start` itself.
    pub fn reachable_from(&self, start: &NodeId) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        if !self.nodes.contains_key(start) {
            return seen;
        }

        let mut queue = VecDeque::from([start.clone()]);
        seen.insert(start.clone());
        while let Some(current) = queue.pop_front() {
            if let Some(outgoing) = self.edges.get(&current) {
                for edge in outgoing.values() {
                    for destination in &edge.destinations {
                        if seen.insert(destination.clone()) {
                            queue.push_back(destination.clone());
                        }
                    }
                }
            }
        }
        seen
    }

    /// Shortest action sequence from `from` to `to` over recorded edges.
    ///
    /// Breadth-first; conflicted edges route through their first-observed
    /// destination so the result stays deterministic. `Some(vec![])` when the
    /// endpoints coincide, `None` when no route is known.
    pub fn shortest_path(&self, from: &NodeId, to: &NodeId) -> Option<Vec<String>> {
        if !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            return None;
        }
        if from == to {
            return Some(Vec::new());
        }

        let mut predecessor: HashMap<NodeId, (NodeId, String)> = HashMap::new();
        let mut queue = VecDeque::from([from.clone()]);

        while let Some(current) = queue.pop_front() {
            if let Some(outgoing) = self.edges.get(&current) {
                for (action, edge) in outgoing {
                    let next = edge.primary_destination();
                    if next == from || predecessor.contains_key(next) {
                        continue;
                    }
                    predecessor.insert(next.clone(), (current.clone(), action.clone()));
                    if next == to {
                        let mut path = Vec::new();
                        let mut cursor = to.clone();
                        while cursor != *from {
                            let (prev, action) = predecessor[&cursor].clone();
                            path.push(action);
                            cursor = prev;
                        }
                        path.reverse();
                        return Some(path);
                    }
                    queue.push_back(next.clone());
                }
            }
        }
        None
    }
}
