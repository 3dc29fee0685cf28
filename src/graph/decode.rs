use serde_json::{Map, Value};

use super::{ActionInfo, AgentInfo, Edge, Node, NodeKind, RawGraph, Relation, SessionInfo};

/// Node record on the wire. Kind-specific fields may sit at the top level or
/// under `props`/`properties`, which is where a graph database dumps the raw
/// node properties.
struct WireNode<'a> {
    obj: &'a Map<String, Value>,
    props: Option<&'a Map<String, Value>>,
}

impl<'a> WireNode<'a> {
    fn new(value: &'a Value) -> Option<Self> {
        let obj = value.as_object()?;
        let props = obj
            .get("props")
            .or_else(|| obj.get("properties"))
            .and_then(|v| v.as_object());
        Some(Self { obj, props })
    }

    /// Top-level field only.
    fn own(&self, key: &str) -> Option<String> {
        self.obj.get(key).and_then(text)
    }

    /// Nested property only.
    fn prop(&self, key: &str) -> Option<String> {
        self.props?.get(key).and_then(text)
    }

    /// Top-level field, falling back to the nested property of the same name.
    fn field(&self, key: &str) -> Option<String> {
        self.own(key).or_else(|| self.prop(key))
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.obj
            .get(key)
            .filter(|v| !is_blank(v))
            .or_else(|| self.props?.get(key).filter(|v| !is_blank(v)))
    }
}

/// Scalar as display text. Empty strings count as absent.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub(super) fn decode_graph(value: &Value) -> RawGraph {
    let nodes: Vec<Node> = value
        .get("nodes")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(decode_node).collect())
        .unwrap_or_default();

    let edges: Vec<Edge> = value
        .get("edges")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(decode_edge).collect())
        .unwrap_or_default();

    log::debug!(nodes = nodes.len(), edges = edges.len(); "Decoded graph snapshot");
    RawGraph { nodes, edges }
}

fn decode_node(value: &Value) -> Option<Node> {
    let Some(wire) = WireNode::new(value) else {
        log::debug!("Skipping node record that is not an object");
        return None;
    };
    let Some(id) = wire.field("id") else {
        log::debug!("Skipping node record without an id");
        return None;
    };

    let tag = wire.own("kind").or_else(|| wire.own("type"));
    let kind = match tag.as_deref().and_then(NodeKind::from_tag) {
        Some(kind) => kind,
        None => {
            log::debug!(id = id, kind:? = tag; "Unrecognized node kind, treating as action");
            NodeKind::Action
        }
    };

    let label = wire.own("label");
    let node = match kind {
        NodeKind::Agent => Node::agent(
            id,
            AgentInfo {
                name: label.or_else(|| wire.field("name")),
                // Inside `props`, `type` is the agent's role rather than the node kind.
                agent_type: wire.field("agent_type").or_else(|| wire.prop("type")),
            },
        ),
        NodeKind::Session => Node::session(
            id,
            SessionInfo {
                name: label.or_else(|| wire.prop("label")),
                model: wire.field("model"),
                channel: wire.field("channel"),
                started_at: wire
                    .field("started_at")
                    .or_else(|| wire.field("timestamp")),
            },
        ),
        NodeKind::Action => Node::action(
            id,
            ActionInfo {
                action_type: wire.field("action_type").or_else(|| wire.prop("type")),
                name: label.or_else(|| wire.field("name")),
                timestamp: wire.field("timestamp"),
                details: wire.raw("details").cloned(),
            },
        ),
    };
    Some(node)
}

fn decode_edge(value: &Value) -> Option<Edge> {
    let obj = value.as_object()?;
    let source = obj.get("source").and_then(text)?;
    let target = obj.get("target").and_then(text)?;
    let relation = obj
        .get("relation")
        .or_else(|| obj.get("type"))
        .and_then(|v| v.as_str())
        .map(Relation::from)
        .unwrap_or_else(|| Relation::Other(String::new()));
    Some(Edge {
        source,
        target,
        relation,
    })
}
