//! Graph layout engine.
//!
//! Turns a [`RawGraph`] into per-node levels, a reduced set of display edges
//! and multi-line labels. [`compute`] is a pure function of its input and
//! has no failure mode for malformed data.

pub mod classify;
pub mod labels;
pub mod levels;

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::config::LabelConfig;
use crate::graph::{Edge, NodeId, RawGraph};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DisplayEdge {
    pub source: NodeId,
    pub target: NodeId,
}

impl From<&Edge> for DisplayEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
        }
    }
}

/// A renderable graph. Maps are keyed in input node order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub levels: IndexMap<NodeId, usize>,
    pub display_edges: Vec<DisplayEdge>,
    pub labels: IndexMap<NodeId, String>,
}

impl LayoutResult {
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.levels.get(id).copied()
    }

    pub fn label_of(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Deepest assigned level.
    pub fn depth(&self) -> usize {
        self.levels.values().copied().max().unwrap_or(0)
    }
}

/// Outcome of a layout pass. `Empty` means there was nothing to draw, which
/// a renderer should show as an explicit empty state.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Empty,
    Ready(LayoutResult),
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        matches!(self, Layout::Empty)
    }

    pub fn result(&self) -> Option<&LayoutResult> {
        match self {
            Layout::Empty => None,
            Layout::Ready(result) => Some(result),
        }
    }
}

impl Serialize for Layout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            empty: bool,
            #[serde(flatten)]
            result: Option<&'a LayoutResult>,
        }

        Wire {
            empty: self.is_empty(),
            result: self.result(),
        }
        .serialize(serializer)
    }
}

/// Lay out one graph snapshot.
pub fn compute(graph: &RawGraph, config: &LabelConfig) -> Layout {
    if graph.nodes.is_empty() {
        log::debug!("No nodes in snapshot, nothing to lay out");
        return Layout::Empty;
    }

    let known = graph.node_ids();
    if known.len() != graph.nodes.len() {
        log::warn!(
            nodes = graph.nodes.len(),
            unique = known.len();
            "Snapshot contains duplicate node ids, keeping the first of each"
        );
    }

    let buckets = classify::classify(&graph.edges);
    let display = buckets.display_edges();
    log::debug!(
        has_session = buckets.has_session.len(),
        spawned = buckets.spawned.len(),
        contains = buckets.contains.len(),
        followed_by = buckets.followed_by.len(),
        ignored = buckets.ignored,
        display = display.len();
        "Classified edges"
    );

    let levels = levels::assign(&graph.nodes, &display, &known);
    let display_edges = resolved_edges(&display, &known);
    if display_edges.len() != display.len() {
        log::debug!(dropped = display.len() - display_edges.len(); "Dropped edges with unknown endpoints");
    }

    let mut labels = IndexMap::with_capacity(levels.len());
    for node in &graph.nodes {
        labels
            .entry(node.id.clone())
            .or_insert_with(|| labels::synthesize(node, config));
    }

    Layout::Ready(LayoutResult {
        levels,
        display_edges,
        labels,
    })
}

fn resolved_edges(edges: &[&Edge], known: &HashSet<&str>) -> Vec<DisplayEdge> {
    edges
        .iter()
        .filter(|e| known.contains(e.source.as_str()) && known.contains(e.target.as_str()))
        .map(|&e| DisplayEdge::from(e))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;

#[cfg(test)]
mod tests {
    use super::helpers::*;
    use super::*;
    use crate::graph::{Node, NodeKind};

    fn layout(graph: &RawGraph) -> LayoutResult {
        match compute(graph, &LabelConfig::default()) {
            Layout::Ready(result) => result,
            Layout::Empty => panic!("expected a layout"),
        }
    }

    fn has_edge(result: &LayoutResult, source: &str, target: &str) -> bool {
        result
            .display_edges
            .iter()
            .any(|e| e.source == source && e.target == target)
    }

    #[test]
    fn empty_input_is_distinct_outcome() {
        let out = compute(&RawGraph::default(), &LabelConfig::default());
        assert!(out.is_empty());
        assert!(out.result().is_none());
        assert_eq!(serde_json::to_value(&out).unwrap(), serde_json::json!({"empty": true}));
    }

    #[test]
    fn edges_without_nodes_are_still_empty() {
        let g = graph(Vec::new(), vec![edge("a", "b", "HAS_SESSION")]);
        assert!(compute(&g, &LabelConfig::default()).is_empty());
    }

    #[test]
    fn single_chain_session() {
        let g = chain_graph();
        let result = layout(&g);

        assert_eq!(result.level_of("main"), Some(0));
        assert_eq!(result.level_of("s1"), Some(1));
        assert_eq!(result.level_of("a1"), Some(2));
        assert_eq!(result.level_of("a2"), Some(3));
        assert_eq!(result.level_of("a3"), Some(4));
        assert_eq!(result.depth(), 4);

        assert!(has_edge(&result, "s1", "a1"));
        assert!(!has_edge(&result, "s1", "a2"));
        assert!(!has_edge(&result, "s1", "a3"));
        assert!(has_edge(&result, "a1", "a2"));
        assert!(has_edge(&result, "a2", "a3"));
        assert_eq!(result.display_edges.len(), 4);
    }

    #[test]
    fn dangling_edges_never_reach_output() {
        let g = graph(
            vec![agent("main"), session("s1")],
            vec![
                edge("main", "s1", "HAS_SESSION"),
                edge("main", "ghost-session", "HAS_SESSION"),
                edge("ghost-session", "ghost-action", "CONTAINS"),
                edge("ghost-agent", "main", "SPAWNED"),
            ],
        );
        let result = layout(&g);
        assert_eq!(result.display_edges, vec![DisplayEdge { source: "main".into(), target: "s1".into() }]);
        assert_eq!(result.levels.len(), 2);
    }

    #[test]
    fn orphan_session_gets_level_one() {
        let g = graph(
            vec![agent("main"), session("orphan"), action("stray", "tool_call")],
            vec![edge("ghost", "orphan", "HAS_SESSION")],
        );
        let result = layout(&g);
        assert_eq!(result.level_of("orphan"), Some(1));
        assert_eq!(result.level_of("stray"), Some(2));
    }

    #[test]
    fn unknown_relations_are_not_displayed() {
        let g = graph(
            vec![agent("main"), session("s1")],
            vec![edge("main", "s1", "OBSERVED")],
        );
        let result = layout(&g);
        assert!(result.display_edges.is_empty());
        assert_eq!(result.level_of("s1"), Some(1));
    }

    #[test]
    fn every_node_gets_a_level_and_label() {
        let g = chain_graph();
        let result = layout(&g);
        for node in &g.nodes {
            assert!(result.levels.contains_key(&node.id), "missing level for {}", node.id);
            assert!(result.labels.contains_key(&node.id), "missing label for {}", node.id);
        }
        for node in g.nodes.iter().filter(|n| n.kind() == NodeKind::Agent) {
            assert_eq!(result.levels[&node.id], 0);
        }
    }

    #[test]
    fn duplicate_ids_keep_first_label() {
        let first = Node::agent("main", crate::graph::AgentInfo { name: Some("first".into()), agent_type: None });
        let second = Node::agent("main", crate::graph::AgentInfo { name: Some("second".into()), agent_type: None });
        let result = layout(&graph(vec![first, second], Vec::new()));
        assert_eq!(result.labels.len(), 1);
        assert_eq!(result.label_of("main"), Some("first"));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let g = chain_graph();
        let config = LabelConfig::default();
        assert_eq!(compute(&g, &config), compute(&g, &config));
    }

    #[test]
    fn serializes_output_contract() {
        let g = graph(
            vec![agent("main"), session("s1")],
            vec![edge("main", "s1", "HAS_SESSION")],
        );
        let value = serde_json::to_value(compute(&g, &LabelConfig::default())).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "empty": false,
                "levels": {"main": 0, "s1": 1},
                "displayEdges": [{"source": "main", "target": "s1"}],
                "labels": {"main": "main", "s1": "s1"}
            })
        );
    }

    #[test]
    fn label_config_bounds_are_honored() {
        let g = graph(vec![named_session("s1", "abcdefghij")], Vec::new());
        let config = LabelConfig { session_name_max: 4, ..LabelConfig::default() };
        let out = compute(&g, &config);
        assert_eq!(out.result().and_then(|r| r.label_of("s1")), Some("abcd"));
    }
}
