//! Exploration planner - decides what a session should try next.
//!
//! The policy is systematic depth-first mapping rather than ad hoc wandering:
//! untried actions at the current node come first (lexicographically smallest,
//! for reproducibility), then a breadth-first backtrack toward the nearest
//! node that still has untried actions, and only when no reachable node has
//! an open frontier is the session declared exhausted. Work is never repeated
//! once an edge is known.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use world_graph::{NodeId, SharedGraph, StateGraph};

use crate::session::{Session, SessionId};

/// What the planner wants the session to do next.
///
/// Callers must distinguish `Explore` (new ground) from `Backtrack` (retrace
/// of known edges): the environment has no teleport, so a backtrack is issued
/// as literal actions, one per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlannedAction {
    /// Try an untried action at the current node.
    Explore { action: String },

    /// Retrace one known edge on the way to `destination`, which still has an
    /// open frontier. `remaining` counts the retrace actions left after this
    /// one.
    Backtrack {
        action: String,
        remaining: usize,
        destination: NodeId,
    },

    /// No reachable node has an open frontier.
    Complete { reason: String },
}

/// An in-progress retrace: the actions still to issue and the node the cursor
/// must be on before each of them.
#[derive(Debug, Clone)]
struct PendingRetrace {
    /// `(action, node the action should land on)` in order.
    steps: VecDeque<(String, NodeId)>,

    /// Node the next action must be issued from.
    expect_at: NodeId,

    destination: NodeId,
}

/// Frontier-first planner with per-session retrace state.
///
/// The planner owns no graph data; it reads the shared store on every call,
/// so discoveries made by other sessions are picked up immediately. A retrace
/// plan is dropped the moment the cursor is somewhere it did not expect or a
/// frontier opens at the current node.
pub struct ExplorationPlanner {
    /// Route retraces over edges any session recorded, not only this one's.
    share_discoveries: bool,

    pending: HashMap<SessionId, PendingRetrace>,
}

impl ExplorationPlanner {
    /// Create a planner. `share_discoveries` selects global vs session-local
    /// edges for backtrack routing.
    pub fn new(share_discoveries: bool) -> Self {
        Self {
            share_discoveries,
            pending: HashMap::new(),
        }
    }

    /// Decide the next action for `session`.
    pub fn next_action(&mut self, session: &Session, graph: &SharedGraph) -> PlannedAction {
        let current = &session.current_node;

        // 1. Untried actions at the current node always win.
        let frontier = graph.frontier(current);
        if let Some(action) = frontier.into_iter().next() {
            self.pending.remove(&session.id);
            tracing::debug!(session = %session.id, node = %current.short(), %action, "exploring frontier");
            return PlannedAction::Explore { action };
        }

        // 2. Continue an in-progress retrace if the cursor is on track.
        if let Some(pending) = self.pending.get_mut(&session.id) {
            if pending.expect_at == *current {
                if let Some((action, lands_on)) = pending.steps.pop_front() {
                    let remaining = pending.steps.len();
                    let destination = pending.destination.clone();
                    pending.expect_at = lands_on;
                    if remaining == 0 {
                        self.pending.remove(&session.id);
                    }
                    return PlannedAction::Backtrack { action, remaining, destination };
                }
            }
            // Off track, or the graph moved underneath the plan.
            self.pending.remove(&session.id);
        }

        // 3. Plan a fresh route to the nearest open frontier.
        match self.route_to_frontier(session, graph) {
            // A route always has at least one hop: the current node's own
            // frontier was empty, so the destination is elsewhere.
            Some(route) if !route.steps.is_empty() => {
                let mut pending = PendingRetrace {
                    steps: route.steps.into(),
                    expect_at: current.clone(),
                    destination: route.destination.clone(),
                };
                // First hop goes out immediately.
                let Some((action, lands_on)) = pending.steps.pop_front() else {
                    unreachable!()
                };
                let remaining = pending.steps.len();
                pending.expect_at = lands_on;
                tracing::debug!(
                    session = %session.id,
                    destination = %route.destination.short(),
                    hops = remaining + 1,
                    "backtracking to nearest frontier"
                );
                if remaining > 0 {
                    self.pending.insert(session.id, pending);
                }
                PlannedAction::Backtrack {
                    action,
                    remaining,
                    destination: route.destination,
                }
            }
            _ => {
                tracing::info!(session = %session.id, "exploration exhausted");
                PlannedAction::Complete { reason: "fully-explored".to_string() }
            }
        }
    }

    /// Drop any retrace state for a session (e.g. when it ends).
    pub fn forget_session(&mut self, id: SessionId) {
        self.pending.remove(&id);
    }

    /// Breadth-first search from the session's current node to the nearest
    /// node with a non-empty frontier, over global or session-local edges.
    fn route_to_frontier(&self, session: &Session, graph: &SharedGraph) -> Option<FrontierRoute> {
        graph.with_graph(|g| {
            let adjacency = if self.share_discoveries {
                global_adjacency(g)
            } else {
                local_adjacency(session)
            };
            bfs_to_frontier(&session.current_node, &adjacency, g)
        })
    }
}

struct FrontierRoute {
    steps: Vec<(String, NodeId)>,
    destination: NodeId,
}

fn global_adjacency(graph: &StateGraph) -> HashMap<NodeId, Vec<(String, NodeId)>> {
    graph
        .nodes()
        .map(|node| (node.id.clone(), graph.neighbors(&node.id)))
        .collect()
}

/// Adjacency over only the edges this session has itself traversed.
fn local_adjacency(session: &Session) -> HashMap<NodeId, Vec<(String, NodeId)>> {
    let mut adjacency: HashMap<NodeId, Vec<(String, NodeId)>> = HashMap::new();
    for step in &session.path {
        let outgoing = adjacency.entry(step.from.clone()).or_default();
        let hop = (step.action.clone(), step.to.clone());
        if !outgoing.contains(&hop) {
            outgoing.push(hop);
        }
    }
    adjacency
}

fn bfs_to_frontier(
    start: &NodeId,
    adjacency: &HashMap<NodeId, Vec<(String, NodeId)>>,
    graph: &StateGraph,
) -> Option<FrontierRoute> {
    let mut predecessor: HashMap<NodeId, (NodeId, String)> = HashMap::new();
    let mut seen: HashSet<NodeId> = HashSet::from([start.clone()]);
    let mut queue = VecDeque::from([start.clone()]);

    while let Some(current) = queue.pop_front() {
        if let Some(outgoing) = adjacency.get(&current) {
            for (action, next) in outgoing {
                if !seen.insert(next.clone()) {
                    continue;
                }
                predecessor.insert(next.clone(), (current.clone(), action.clone()));
                if !graph.frontier(next).is_empty() {
                    return Some(FrontierRoute {
                        steps: walk_back(start, next, &predecessor),
                        destination: next.clone(),
                    });
                }
                queue.push_back(next.clone());
            }
        }
    }
    None
}

fn walk_back(
    start: &NodeId,
    target: &NodeId,
    predecessor: &HashMap<NodeId, (NodeId, String)>,
) -> Vec<(String, NodeId)> {
    let mut steps = Vec::new();
    let mut cursor = target.clone();
    while cursor != *start {
        let (prev, action) = predecessor[&cursor].clone();
        steps.push((action, cursor));
        cursor = prev;
    }
    steps.reverse();
    steps
}
