//! End-to-end exploration scenarios over the engine facade.
//!
//! These walk a small hand-built dungeon the way an agent adapter would:
//! observe, ask the planner, act, feed the result back.

use explorer_core::{
    ExplorationEngine, ExplorerConfig, PlannedAction, SessionStatus,
};
use world_graph::Observation;

fn entrance() -> Observation {
    Observation::at("Cave Entrance")
        .with_actions(["go north", "go east", "take torch"])
        .with_item("torch")
}

fn entrance_with_torch() -> Observation {
    Observation::at("Cave Entrance")
        .with_actions(["go north", "go east"])
        .with_inventory("torch")
        .with_score(10)
}

fn chamber() -> Observation {
    Observation::at("Dark Chamber")
        .with_actions(["go south"])
        .with_inventory("torch")
        .with_score(10)
}

#[test]
fn test_pickup_creates_distinct_state() {
    let engine = ExplorationEngine::new(ExplorerConfig::default());
    let id = engine.start_session(&entrance()).unwrap();

    // Taking the torch changes inventory and the action set, so the agent
    // lands on a brand-new node even though the location name is unchanged.
    let step = engine
        .apply_action(id, "take torch", &entrance_with_torch(), true, None)
        .unwrap();
    assert!(step.novel);
    assert_eq!(step.frontier_size, 2);
    assert_eq!(engine.graph().node_count(), 2);

    let step = engine.apply_action(id, "go north", &chamber(), true, None).unwrap();
    assert!(step.novel);

    let session = engine.session(id).unwrap();
    assert_eq!(session.path.len(), 2);
    assert_eq!(session.move_count, 2);

    let stats = engine.session_stats(id).unwrap();
    // Every node known so far has been visited by this session.
    assert!((stats.coverage - 1.0).abs() < 1e-9);
    assert_eq!(stats.nodes_visited, 3);
}

#[test]
fn test_planner_drives_session_to_exhaustion() {
    let engine = ExplorationEngine::new(ExplorerConfig::default());

    // Two-room world: Hall <-> Cell, where "search" in the cell loops.
    let hall = Observation::at("Hall").with_action("go east");
    let cell = Observation::at("Cell").with_actions(["go west", "search"]);

    let id = engine.start_session(&hall).unwrap();

    // Scripted environment: what each (location, action) pair leads to.
    let outcome = |location: &str, action: &str| -> Observation {
        match (location, action) {
            ("Hall", "go east") => cell.clone(),
            ("Cell", "go west") => hall.clone(),
            ("Cell", "search") => cell.clone(),
            other => panic!("unplanned transition {other:?}"),
        }
    };

    let mut moves = 0;
    let reason = loop {
        assert!(moves < 20, "planner failed to terminate");
        match engine.next_planned_action(id).unwrap() {
            PlannedAction::Explore { action } | PlannedAction::Backtrack { action, .. } => {
                let location = engine
                    .graph()
                    .node(&engine.session(id).unwrap().current_node)
                    .unwrap()
                    .description;
                engine
                    .apply_action(id, &action, &outcome(&location, &action), true, None)
                    .unwrap();
                moves += 1;
            }
            PlannedAction::Complete { reason } => break reason,
        }
    };

    assert_eq!(reason, "fully-explored");
    // Every action at every node has been tried exactly once, plus the
    // backtrack hop to reach the cell's remaining frontier.
    assert_eq!(engine.graph().node_count(), 2);
    assert_eq!(engine.graph().edge_count(), 3);
    engine.graph().with_graph(|g| {
        assert!(g.nodes().all(|n| g.frontier(&n.id).is_empty()));
    });
}

#[test]
fn test_sessions_converge_on_one_map() {
    let engine = ExplorationEngine::new(ExplorerConfig::default());

    let first = engine.start_session(&entrance()).unwrap();
    let second = engine.start_session(&entrance()).unwrap();

    let a = engine
        .apply_action(first, "take torch", &entrance_with_torch(), true, None)
        .unwrap();
    let b = engine
        .apply_action(second, "take torch", &entrance_with_torch(), true, None)
        .unwrap();

    // Same transition, one map entry. Only the first observation is novel.
    assert!(a.novel);
    assert!(!b.novel);
    assert_eq!(a.node_id, b.node_id);
    assert_eq!(engine.graph().node_count(), 2);
    assert_eq!(engine.graph().edge_count(), 1);

    engine.graph().with_graph(|g| {
        let node = g.node(&a.node_id).unwrap();
        assert_eq!(node.visit_count, 2);
        assert_eq!(node.first_discovered_by, first.to_string());
    });
}

#[test]
fn test_abandoned_session_leaves_its_discoveries() {
    let engine = ExplorationEngine::new(ExplorerConfig::default());

    let scout = engine.start_session(&entrance()).unwrap();
    engine
        .apply_action(scout, "take torch", &entrance_with_torch(), true, None)
        .unwrap();
    engine.apply_action(scout, "go north", &chamber(), true, None).unwrap();
    engine.abandon(scout, "operator cancel").unwrap();

    assert_eq!(engine.session(scout).unwrap().status, SessionStatus::Abandoned);
    assert!(engine.next_planned_action(scout).is_err());

    // A later session plans over what the abandoned one mapped.
    let id = engine.start_session(&entrance()).unwrap();
    assert_eq!(engine.graph().node_count(), 3);
    assert!(matches!(
        engine.next_planned_action(id).unwrap(),
        PlannedAction::Explore { .. }
    ));
}

#[test]
fn test_victory_run_statistics() {
    let engine = ExplorationEngine::new(ExplorerConfig::default());

    let id = engine.start_session(&entrance()).unwrap();
    engine
        .apply_action(id, "take torch", &entrance_with_torch(), true, None)
        .unwrap();
    let exit = Observation::at("Forest Exit").with_score(110).with_terminal(true);
    let step = engine.apply_action(id, "go east", &exit, true, None).unwrap();
    assert_eq!(step.status, SessionStatus::Completed);

    let session = engine.session(id).unwrap();
    assert!(session.victory);

    let stats = engine.session_stats(id).unwrap();
    assert!((stats.efficiency - 55.0).abs() < 1e-9);
    // The run took the shortest known route.
    assert_eq!(stats.path_optimality, Some(1.0));

    let global = engine.global_stats();
    assert_eq!(global.total_sessions, 1);
    assert!((global.success_rate - 1.0).abs() < 1e-9);
    assert_eq!(global.conflict_count, 0);
}

#[test]
fn test_nondeterministic_edge_flagged_not_fatal() {
    let engine = ExplorationEngine::new(ExplorerConfig::default());

    let pit = Observation::at("Pit Edge").with_action("jump");
    let ledge = Observation::at("Far Ledge").with_action("rest");
    let bottom = Observation::at("Pit Bottom").with_action("climb");

    let one = engine.start_session(&pit).unwrap();
    let two = engine.start_session(&pit).unwrap();

    let first = engine.apply_action(one, "jump", &ledge, true, None).unwrap();
    let second = engine.apply_action(two, "jump", &bottom, false, None).unwrap();

    // The divergent outcome is itself a novel observation, now flagged.
    assert!(first.novel);
    assert!(second.novel);
    assert_ne!(first.node_id, second.node_id);

    engine.graph().with_graph(|g| {
        let start = g
            .nodes()
            .find(|n| n.description == "Pit Edge")
            .map(|n| n.id.clone())
            .unwrap();
        let edge = g.edge(&start, "jump").unwrap();
        assert!(edge.is_conflicted());
        assert_eq!(edge.destinations.len(), 2);
        assert_eq!(edge.attempts, 2);
        assert_eq!(edge.success_count, 1);
        // Deterministic pathing still routes via the first-observed outcome.
        assert_eq!(edge.primary_destination(), &first.node_id);
    });
}
