//! Raw activity graph as delivered by a data provider.
//!
//! Nodes are agents, sessions and actions; edges carry one of four relations.
//! The shapes here are permissive: upstream data comes from a
//! separate ingestion process and may reference nodes that do not exist,
//! carry unknown relation names, or hold half-serialized metadata.

mod decode;

use std::collections::HashSet;
use std::fmt;

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type NodeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Agent,
    Session,
    Action,
}

impl NodeKind {
    /// Parse a wire kind tag. Unknown tags yield `None`; callers treat those
    /// nodes as generic actions.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Agent" => Some(NodeKind::Agent),
            "Session" => Some(NodeKind::Session),
            "Action" => Some(NodeKind::Action),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Agent => write!(f, "Agent"),
            NodeKind::Session => write!(f, "Session"),
            NodeKind::Action => write!(f, "Action"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentInfo {
    pub name: Option<String>,
    /// `main` or `subagent` when the provider knows it.
    pub agent_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionInfo {
    pub name: Option<String>,
    pub model: Option<String>,
    pub channel: Option<String>,
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionInfo {
    /// Tool name or message kind, e.g. `tool_call`, `user_message`.
    pub action_type: Option<String>,
    pub name: Option<String>,
    pub timestamp: Option<String>,
    /// Opaque payload: a JSON record, or a string that may hold one.
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Agent(AgentInfo),
    Session(SessionInfo),
    Action(ActionInfo),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub data: NodeData,
}

impl Node {
    pub fn agent(id: impl Into<NodeId>, info: AgentInfo) -> Self {
        Self {
            id: id.into(),
            data: NodeData::Agent(info),
        }
    }

    pub fn session(id: impl Into<NodeId>, info: SessionInfo) -> Self {
        Self {
            id: id.into(),
            data: NodeData::Session(info),
        }
    }

    pub fn action(id: impl Into<NodeId>, info: ActionInfo) -> Self {
        Self {
            id: id.into(),
            data: NodeData::Action(info),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Agent(_) => NodeKind::Agent,
            NodeData::Session(_) => NodeKind::Session,
            NodeData::Action(_) => NodeKind::Action,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Agent(a) => a.name.as_deref(),
            NodeData::Session(s) => s.name.as_deref(),
            NodeData::Action(a) => a.name.as_deref(),
        }
    }
}

/// Edge relation. Relations the engine does not visualize are kept verbatim
/// in `Other` so they survive a decode/encode pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relation {
    HasSession,
    Spawned,
    Contains,
    FollowedBy,
    Other(String),
}

impl Relation {
    pub fn as_str(&self) -> &str {
        match self {
            Relation::HasSession => "HAS_SESSION",
            Relation::Spawned => "SPAWNED",
            Relation::Contains => "CONTAINS",
            Relation::FollowedBy => "FOLLOWED_BY",
            Relation::Other(s) => s,
        }
    }
}

impl From<String> for Relation {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "HAS_SESSION" => Relation::HasSession,
            "SPAWNED" => Relation::Spawned,
            "CONTAINS" => Relation::Contains,
            "FOLLOWED_BY" => Relation::FollowedBy,
            _ => Relation::Other(tag),
        }
    }
}

impl From<&str> for Relation {
    fn from(tag: &str) -> Self {
        Relation::from(tag.to_string())
    }
}

impl From<Relation> for String {
    fn from(relation: Relation) -> Self {
        relation.as_str().to_string()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, relation: Relation) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation,
        }
    }
}

/// One graph snapshot, in provider order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl RawGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Decode a provider snapshot `{ "nodes": [...], "edges": [...] }`.
    ///
    /// Only a document that is not JSON at all is an error. Missing lists,
    /// nodes without an id and edges without endpoints are dropped.
    pub fn from_json(source: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(source).wrap_err("Graph snapshot is not valid JSON")?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        decode::decode_graph(value)
    }

    /// Ids of every node in the snapshot.
    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
