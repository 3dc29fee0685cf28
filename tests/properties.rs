//! Property tests for the layout engine over arbitrary, partly malformed
//! graphs.

use std::collections::HashSet;

use agentviz::config::LabelConfig;
use agentviz::graph::{ActionInfo, AgentInfo, Edge, Node, NodeKind, RawGraph, Relation, SessionInfo};
use agentviz::layout::{compute, Layout};
use proptest::prelude::*;
use serde_json::Value;

// ===================
// Strategies
// ===================

/// Small id space so edges often hit real nodes, plus a few ids no node has.
fn id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => (0u8..12).prop_map(|i| format!("n{i}")),
        1 => (0u8..3).prop_map(|i| format!("ghost{i}")),
    ]
}

fn details_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::String("{}".into()))),
        Just(Some(Value::String("{'tool': 'x'}".into()))),
        Just(Some(Value::String("not json".into()))),
        ".{0,80}".prop_map(|s| Some(Value::String(s))),
        Just(Some(serde_json::json!({"tool": "read", "args_preview": "a.rs"}))),
        Just(Some(serde_json::json!([1, 2, 3]))),
    ]
}

fn node_strategy() -> impl Strategy<Value = Node> {
    let name = proptest::option::of("[a-z ]{0,60}");
    (
        (0u8..12).prop_map(|i| format!("n{i}")),
        0u8..3,
        name,
        details_strategy(),
        proptest::option::of(Just("2025-01-01T10:00:00Z".to_string())),
    )
        .prop_map(|(id, kind, name, details, timestamp)| match kind {
            0 => Node::agent(id, AgentInfo { name, agent_type: None }),
            1 => Node::session(
                id,
                SessionInfo {
                    name,
                    ..Default::default()
                },
            ),
            _ => Node::action(
                id,
                ActionInfo {
                    action_type: Some("tool_call".into()),
                    name,
                    timestamp,
                    details,
                },
            ),
        })
}

fn relation_strategy() -> impl Strategy<Value = Relation> {
    prop_oneof![
        Just(Relation::HasSession),
        Just(Relation::Spawned),
        Just(Relation::Contains),
        Just(Relation::FollowedBy),
        "[A-Z_]{1,10}".prop_map(Relation::from),
    ]
}

fn edge_strategy() -> impl Strategy<Value = Edge> {
    (id_strategy(), id_strategy(), relation_strategy()).prop_map(|(s, t, r)| Edge::new(s, t, r))
}

fn graph_strategy() -> impl Strategy<Value = RawGraph> {
    (
        proptest::collection::vec(node_strategy(), 0..16),
        proptest::collection::vec(edge_strategy(), 0..40),
    )
        .prop_map(|(nodes, edges)| RawGraph::new(nodes, edges))
}

// ===================
// Checks
// ===================

fn check_layout_invariants(graph: &RawGraph) -> Result<(), TestCaseError> {
    let layout = compute(graph, &LabelConfig::default());
    let result = match layout {
        Layout::Empty => {
            prop_assert!(graph.nodes.is_empty());
            return Ok(());
        }
        Layout::Ready(result) => result,
    };

    let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    prop_assert_eq!(result.levels.len(), ids.len());
    prop_assert_eq!(result.labels.len(), ids.len());
    for id in &ids {
        prop_assert!(result.levels.contains_key(*id));
        prop_assert!(result.labels.contains_key(*id));
    }

    let mut first_seen = HashSet::new();
    for node in &graph.nodes {
        if first_seen.insert(node.id.as_str()) && node.kind() == NodeKind::Agent {
            prop_assert_eq!(result.levels[&node.id], 0);
        }
    }

    for edge in &result.display_edges {
        prop_assert!(ids.contains(edge.source.as_str()));
        prop_assert!(ids.contains(edge.target.as_str()));
    }

    let followed: HashSet<&str> = graph
        .edges
        .iter()
        .filter(|e| e.relation == Relation::FollowedBy)
        .map(|e| e.target.as_str())
        .collect();
    for edge in &graph.edges {
        let shown = result
            .display_edges
            .iter()
            .any(|d| d.source == edge.source && d.target == edge.target);
        if edge.relation == Relation::Contains && followed.contains(edge.target.as_str()) {
            // Only shown if another relation links the same pair.
            let linked_otherwise = graph.edges.iter().any(|o| {
                o.source == edge.source && o.target == edge.target && o.relation != Relation::Contains
            });
            prop_assert!(!shown || linked_otherwise);
        }
    }
    Ok(())
}

fn check_deterministic(graph: &RawGraph) -> Result<(), TestCaseError> {
    let config = LabelConfig::default();
    let first = serde_json::to_string(&compute(graph, &config)).unwrap();
    let second = serde_json::to_string(&compute(graph, &config)).unwrap();
    prop_assert_eq!(first, second);
    Ok(())
}

proptest! {
    #[test]
    fn layout_invariants_hold(graph in graph_strategy()) {
        check_layout_invariants(&graph)?;
    }

    #[test]
    fn layout_is_deterministic(graph in graph_strategy()) {
        check_deterministic(&graph)?;
    }
}
