use std::collections::HashSet;

use crate::graph::{NodeData, NodeKind, RawGraph};

/// Which node kinds the view shows. Agents are always visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphFilter {
    pub show_sessions: bool,
    pub show_actions: bool,
}

impl Default for GraphFilter {
    fn default() -> Self {
        Self {
            show_sessions: true,
            show_actions: true,
        }
    }
}

impl GraphFilter {
    pub fn is_identity(&self) -> bool {
        self.show_sessions && self.show_actions
    }

    pub fn shows(&self, kind: NodeKind) -> bool {
        match kind {
            NodeKind::Agent => true,
            NodeKind::Session => self.show_sessions,
            NodeKind::Action => self.show_actions,
        }
    }

    /// Copy of `graph` without the hidden nodes. Edges are kept as they are;
    /// the layout drops any that now point at a missing node.
    pub fn apply(&self, graph: &RawGraph) -> RawGraph {
        if self.is_identity() {
            return graph.clone();
        }
        RawGraph {
            nodes: graph
                .nodes
                .iter()
                .filter(|n| self.shows(n.kind()))
                .cloned()
                .collect(),
            edges: graph.edges.clone(),
        }
    }
}

/// Copy of `graph` keeping only the `limit` newest actions. Untimed actions
/// rank below timed ones; agents, sessions and edges are untouched. A limit of
/// zero keeps everything.
pub fn newest_actions(graph: &RawGraph, limit: usize) -> RawGraph {
    let mut actions: Vec<(&str, Option<&str>)> = graph
        .nodes
        .iter()
        .filter_map(|n| match &n.data {
            NodeData::Action(info) => Some((n.id.as_str(), info.timestamp.as_deref())),
            _ => None,
        })
        .collect();
    if limit == 0 || actions.len() <= limit {
        return graph.clone();
    }

    actions.sort_by(|a, b| b.1.cmp(&a.1));
    let kept: HashSet<&str> = actions.into_iter().take(limit).map(|(id, _)| id).collect();
    log::debug!(limit = limit, total = graph.nodes.len(); "Limiting graph to newest actions");
    RawGraph {
        nodes: graph
            .nodes
            .iter()
            .filter(|n| n.kind() != NodeKind::Action || kept.contains(n.id.as_str()))
            .cloned()
            .collect(),
        edges: graph.edges.clone(),
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
