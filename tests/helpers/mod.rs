use serde_json::Value;

use crate::graph::{ActionInfo, AgentInfo, Edge, Node, RawGraph, Relation, SessionInfo};

/// Agent node with no display name.
pub fn agent(id: &str) -> Node {
    Node::agent(id, AgentInfo::default())
}

/// Agent node with an explicit role (`main` / `subagent`).
pub fn agent_of_type(id: &str, agent_type: &str) -> Node {
    Node::agent(
        id,
        AgentInfo {
            name: None,
            agent_type: Some(agent_type.to_string()),
        },
    )
}

/// Session node with no metadata.
pub fn session(id: &str) -> Node {
    Node::session(id, SessionInfo::default())
}

pub fn named_session(id: &str, name: &str) -> Node {
    Node::session(
        id,
        SessionInfo {
            name: Some(name.to_string()),
            ..SessionInfo::default()
        },
    )
}

/// Session node with a start time.
pub fn session_at(id: &str, started_at: &str) -> Node {
    Node::session(
        id,
        SessionInfo {
            started_at: Some(started_at.to_string()),
            ..SessionInfo::default()
        },
    )
}

/// Action node with a subtype and no name.
pub fn action(id: &str, action_type: &str) -> Node {
    Node::action(
        id,
        ActionInfo {
            action_type: Some(action_type.to_string()),
            ..ActionInfo::default()
        },
    )
}

/// `tool_call` action named after its tool, with a timestamp.
pub fn tool_action(id: &str, tool: &str, timestamp: &str) -> Node {
    Node::action(
        id,
        ActionInfo {
            action_type: Some("tool_call".to_string()),
            name: Some(tool.to_string()),
            timestamp: Some(timestamp.to_string()),
            details: None,
        },
    )
}

/// Action node carrying a details payload.
pub fn action_with_details(id: &str, details: Value) -> Node {
    Node::action(
        id,
        ActionInfo {
            action_type: Some("tool_call".to_string()),
            details: Some(details),
            ..ActionInfo::default()
        },
    )
}

pub fn edge(source: &str, target: &str, relation: &str) -> Edge {
    Edge::new(source, target, Relation::from(relation))
}

pub fn graph(nodes: Vec<Node>, edges: Vec<Edge>) -> RawGraph {
    RawGraph::new(nodes, edges)
}

/// One agent, one session, three chained actions with full containment.
pub fn chain_graph() -> RawGraph {
    graph(
        vec![
            agent("main"),
            session("s1"),
            action("a1", "user_message"),
            action("a2", "tool_call"),
            action("a3", "completion"),
        ],
        vec![
            edge("main", "s1", "HAS_SESSION"),
            edge("s1", "a1", "CONTAINS"),
            edge("s1", "a2", "CONTAINS"),
            edge("s1", "a3", "CONTAINS"),
            edge("a1", "a2", "FOLLOWED_BY"),
            edge("a2", "a3", "FOLLOWED_BY"),
        ],
    )
}

/// Session header line of a session log.
pub fn jsonl_session_header(timestamp: &str) -> String {
    format!(r#"{{"type":"session","id":"hdr","timestamp":"{timestamp}","cwd":"/work"}}"#)
}

/// User message line with a single text block.
pub fn jsonl_user(id: &str, text: &str) -> String {
    serde_json::json!({
        "type": "message",
        "id": id,
        "timestamp": "2025-01-01T10:00:01Z",
        "message": {"role": "user", "content": [{"type": "text", "text": text}]}
    })
    .to_string()
}

/// Assistant message line with one tool call.
pub fn jsonl_tool_call(id: &str, tool: &str, arguments: Value) -> String {
    serde_json::json!({
        "type": "message",
        "id": id,
        "timestamp": "2025-01-01T10:00:02Z",
        "message": {
            "role": "assistant",
            "content": [{"type": "toolCall", "name": tool, "arguments": arguments}]
        }
    })
    .to_string()
}

/// Assistant message line that ends the turn.
pub fn jsonl_completion(id: &str) -> String {
    serde_json::json!({
        "type": "message",
        "id": id,
        "timestamp": "2025-01-01T10:00:03Z",
        "message": {
            "role": "assistant",
            "stopReason": "stop",
            "model": "claude-opus",
            "content": [{"type": "text", "text": "done"}],
            "usage": {"totalTokens": 1200, "cost": {"total": 0.02}}
        }
    })
    .to_string()
}

pub fn jsonl_model_change(id: &str, model: &str) -> String {
    format!(
        r#"{{"type":"model_change","id":"{id}","timestamp":"2025-01-01T10:00:00Z","modelId":"{model}","provider":"anthropic"}}"#
    )
}
