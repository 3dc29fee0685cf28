//! Breadth-first leveling from agent roots.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::graph::{Edge, Node, NodeId, NodeKind};

/// Level given to a node no agent can reach.
pub fn fallback_level(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Agent => 0,
        NodeKind::Session => 1,
        NodeKind::Action => 2,
    }
}

/// Assign every node a depth from the nearest agent, following `edges`.
///
/// Multi-source BFS seeded with all agents at level 0 in node order. The
/// first time a node is dequeued fixes its level; later paths and cycles are
/// ignored. Edges with an endpoint outside `known` are skipped. Nodes never
/// reached get [`fallback_level`]. The result is keyed in node order.
pub fn assign(nodes: &[Node], edges: &[&Edge], known: &HashSet<&str>) -> IndexMap<NodeId, usize> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        let (source, target) = (edge.source.as_str(), edge.target.as_str());
        if known.contains(source) && known.contains(target) {
            children.entry(source).or_default().push(target);
        }
    }

    let mut queue: VecDeque<(&str, usize)> = nodes
        .iter()
        .filter(|n| n.kind() == NodeKind::Agent)
        .map(|n| (n.id.as_str(), 0))
        .collect();
    let mut reached: HashMap<&str, usize> = HashMap::new();

    while let Some((id, level)) = queue.pop_front() {
        if reached.contains_key(id) {
            continue;
        }
        reached.insert(id, level);
        for &child in children.get(id).map(Vec::as_slice).unwrap_or_default() {
            if !reached.contains_key(child) {
                queue.push_back((child, level + 1));
            }
        }
    }

    let mut levels = IndexMap::with_capacity(nodes.len());
    for node in nodes {
        if levels.contains_key(&node.id) {
            continue;
        }
        let level = match reached.get(node.id.as_str()) {
            Some(&level) => level,
            None => {
                let level = fallback_level(node.kind());
                log::trace!(id = node.id, level = level; "Node unreachable from agents, using fallback level");
                level
            }
        };
        levels.insert(node.id.clone(), level);
    }
    levels
}
