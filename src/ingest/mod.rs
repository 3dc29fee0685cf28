pub mod sessions;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};

use crate::graph::{Edge, Node, RawGraph};

/// Trait for graph data providers.
/// Implement this to feed the layout engine from another backend.
pub trait GraphSource {
    /// Short human-readable description, shown in the UI.
    fn describe(&self) -> String;

    /// Load a fresh snapshot.
    fn load(&self) -> Result<RawGraph>;

    /// Path whose changes should trigger a reload, if any.
    fn watch_path(&self) -> Option<&Path> {
        None
    }
}

/// A JSON snapshot file in the `{nodes, edges}` wire format.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    pub path: PathBuf,
}

impl GraphSource for SnapshotFile {
    fn describe(&self) -> String {
        format!("snapshot {}", self.path.display())
    }

    fn load(&self) -> Result<RawGraph> {
        let source = fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("Failed to read {}", self.path.display()))?;
        RawGraph::from_json(&source)
            .wrap_err_with(|| format!("Failed to decode {}", self.path.display()))
    }

    fn watch_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// A directory of agent session logs.
#[derive(Debug, Clone)]
pub struct SessionDir {
    pub dir: PathBuf,
}

impl GraphSource for SessionDir {
    fn describe(&self) -> String {
        format!("sessions {}", self.dir.display())
    }

    fn load(&self) -> Result<RawGraph> {
        let (graph, _) = sessions::load_sessions(&self.dir)?;
        Ok(graph)
    }

    fn watch_path(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

/// Why a session file contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Deleted,
    LockFile,
    Empty,
    NoSessionMeta,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Deleted => write!(f, "deleted"),
            SkipReason::LockFile => write!(f, "lock_file"),
            SkipReason::Empty => write!(f, "empty"),
            SkipReason::NoSessionMeta => write!(f, "no_session_meta"),
        }
    }
}

/// Result of reading one session file.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Synced {
        session_id: String,
        agent: String,
        actions: usize,
        tool_calls: usize,
    },
    Skipped {
        session_id: String,
        reason: SkipReason,
    },
    Failed {
        session_id: String,
        reason: String,
    },
}

impl SessionOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            SessionOutcome::Synced { session_id, .. }
            | SessionOutcome::Skipped { session_id, .. }
            | SessionOutcome::Failed { session_id, .. } => session_id,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, SessionOutcome::Synced { .. })
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.session_id().chars().take(8).collect();
        match self {
            SessionOutcome::Synced {
                actions, tool_calls, ..
            } => write!(f, "✓ {short}... ({actions} actions, {tool_calls} tool calls)"),
            SessionOutcome::Skipped { reason, .. } => write!(f, "- {short}... (skipped: {reason})"),
            SessionOutcome::Failed { reason, .. } => write!(f, "✗ {short}... (error: {reason})"),
        }
    }
}

/// Accumulates nodes and edges across session files. Nodes merge by id
/// (first definition wins) and edges are deduplicated, so re-reading the
/// same agent from many files yields one node.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: RawGraph,
    node_ids: HashSet<String>,
    edges: HashSet<Edge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if a node with this id already exists.
    pub fn add_node(&mut self, node: Node) -> bool {
        if !self.node_ids.insert(node.id.clone()) {
            return false;
        }
        self.graph.nodes.push(node);
        true
    }

    pub fn add_edge(&mut self, edge: Edge) {
        if self.edges.insert(edge.clone()) {
            self.graph.edges.push(edge);
        }
    }

    pub fn finish(self) -> RawGraph {
        self.graph
    }
}
