//! Agent session logs (one JSONL file per session) → activity graph.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use log::{debug, info};
use serde_json::{json, Value};

use crate::graph::{ActionInfo, AgentInfo, Edge, Node, RawGraph, Relation, SessionInfo};

use super::{GraphBuilder, SessionOutcome, SkipReason};

pub const MAIN_AGENT: &str = "main";

/// Entries inspected for agent identity, model and channel.
const HEADER_SCAN: usize = 20;
/// Entries inspected for a session label.
const LABEL_SCAN: usize = 10;
const LABEL_MAX: usize = 50;
const ARGS_PREVIEW_MAX: usize = 200;

const SUBAGENT_MARKER: &str = "You are a **subagent**";
const SUBAGENT_SESSION_PREFIX: &str = "Your session: agent:main:subagent:";
const REQUESTER_PREFIX: &str = "Requester session: ";
const LABEL_PREFIX: &str = "Label: ";

/// List the session logs in a directory, sorted by name.
pub fn session_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .wrap_err_with(|| format!("Failed to read session directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("jsonl"))
        .collect();
    files.sort();
    Ok(files)
}

/// Read every session log in `dir` into one graph.
pub fn load_sessions(dir: &Path) -> Result<(RawGraph, Vec<SessionOutcome>)> {
    let files = session_files(dir)?;
    info!(dir = dir.display().to_string(), files = files.len(); "Reading session logs");

    let mut builder = GraphBuilder::new();
    let mut outcomes = Vec::with_capacity(files.len());
    for path in &files {
        let outcome = parse_session_file(path, &mut builder);
        match &outcome {
            SessionOutcome::Synced { .. } => debug!(outcome = outcome.to_string(); "Session read"),
            SessionOutcome::Skipped { .. } => info!(outcome = outcome.to_string(); "Session skipped"),
            SessionOutcome::Failed { .. } => log::warn!(outcome = outcome.to_string(); "Session failed"),
        }
        outcomes.push(outcome);
    }

    let synced = outcomes.iter().filter(|o| o.is_synced()).count();
    info!(synced = synced, total = outcomes.len(); "Session logs read");
    Ok((builder.finish(), outcomes))
}

/// Parse one session log into `builder`.
pub fn parse_session_file(path: &Path, builder: &mut GraphBuilder) -> SessionOutcome {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let session_id = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    if file_name.contains(".deleted.") {
        return SessionOutcome::Skipped { session_id, reason: SkipReason::Deleted };
    }
    if file_name.ends_with(".lock") {
        return SessionOutcome::Skipped { session_id, reason: SkipReason::LockFile };
    }

    let entries = match read_entries(path) {
        Ok(entries) => entries,
        Err(err) => {
            return SessionOutcome::Failed {
                session_id,
                reason: err.to_string(),
            }
        }
    };
    if entries.is_empty() {
        return SessionOutcome::Skipped { session_id, reason: SkipReason::Empty };
    }

    let Some(header) = entries.iter().find(|e| entry_type(e) == Some("session")) else {
        return SessionOutcome::Skipped { session_id, reason: SkipReason::NoSessionMeta };
    };

    let agent = agent_identity(&entries);
    builder.add_node(Node::agent(
        agent.id.clone(),
        AgentInfo {
            name: Some(agent.name.clone()),
            agent_type: Some(agent.agent_type.to_string()),
        },
    ));
    if let Some(parent) = &agent.parent_id {
        builder.add_edge(Edge::new(parent.clone(), agent.id.clone(), Relation::Spawned));
    }

    let (model, channel) = model_and_channel(&entries);
    builder.add_node(Node::session(
        session_id.clone(),
        SessionInfo {
            name: session_label(&entries),
            model,
            channel,
            started_at: str_field(header, "timestamp"),
        },
    ));
    builder.add_edge(Edge::new(agent.id.clone(), session_id.clone(), Relation::HasSession));

    let mut chain = ActionChain::new(session_id.clone());
    for entry in &entries {
        record_actions(entry, &mut chain, builder);
    }

    SessionOutcome::Synced {
        session_id,
        agent: agent.name,
        actions: chain.actions,
        tool_calls: chain.tool_calls,
    }
}

/// Parse all JSON lines of a file, skipping blank and malformed lines.
fn read_entries(path: &Path) -> std::io::Result<Vec<Value>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => entries.push(value),
            Err(err) => debug!(line = index + 1, error = err.to_string(); "Skipping malformed session line"),
        }
    }
    Ok(entries)
}

fn entry_type(entry: &Value) -> Option<&str> {
    entry.get("type").and_then(|v| v.as_str())
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn role(entry: &Value) -> Option<&str> {
    entry.pointer("/message/role").and_then(|v| v.as_str())
}

/// Text blocks of a message entry, in order.
fn text_blocks(entry: &Value) -> Vec<&str> {
    match entry.pointer("/message/content") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| item.get("type").and_then(|v| v.as_str()) == Some("text"))
            .filter_map(|item| item.get("text").and_then(|v| v.as_str()))
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentType {
    Main,
    Subagent,
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentType::Main => write!(f, "main"),
            AgentType::Subagent => write!(f, "subagent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AgentIdentity {
    id: String,
    name: String,
    agent_type: AgentType,
    parent_id: Option<String>,
}

impl AgentIdentity {
    fn main() -> Self {
        Self {
            id: MAIN_AGENT.to_string(),
            name: MAIN_AGENT.to_string(),
            agent_type: AgentType::Main,
            parent_id: None,
        }
    }
}

/// Decide which agent ran the session. Subagent sessions announce themselves
/// in an early message; everything else belongs to the main agent.
fn agent_identity(entries: &[Value]) -> AgentIdentity {
    for entry in entries.iter().take(HEADER_SCAN) {
        if entry_type(entry) != Some("message") {
            continue;
        }
        for text in text_blocks(entry) {
            if !text.contains(SUBAGENT_MARKER) {
                continue;
            }
            let mut agent = AgentIdentity::main();
            if let Some(key) = subagent_key(text) {
                agent.id = format!("subagent:{key}");
                agent.name = format!("Subagent {key}");
                agent.agent_type = AgentType::Subagent;
            }
            if has_requester(text) {
                agent.parent_id = Some(MAIN_AGENT.to_string());
            }
            if let Some(label) = line_after(text, LABEL_PREFIX) {
                agent.name = label.to_string();
            }
            return agent;
        }
    }
    AgentIdentity::main()
}

/// First eight characters of the subagent session key.
fn subagent_key(text: &str) -> Option<String> {
    let rest = &text[text.find(SUBAGENT_SESSION_PREFIX)? + SUBAGENT_SESSION_PREFIX.len()..];
    let key: String = rest
        .chars()
        .take_while(|c| matches!(*c, 'a'..='f' | '0'..='9' | '-'))
        .take(8)
        .collect();
    (!key.is_empty()).then_some(key)
}

fn has_requester(text: &str) -> bool {
    text.find(REQUESTER_PREFIX)
        .map(|at| &text[at + REQUESTER_PREFIX.len()..])
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace())
}

/// Trimmed remainder of the line following `prefix`, if non-empty.
fn line_after<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = &text[text.find(prefix)? + prefix.len()..];
    let line = rest.lines().next().unwrap_or("").trim();
    (!line.is_empty()).then_some(line)
}

/// Channel the session arrived through, or the first line of the first user
/// message.
fn session_label(entries: &[Value]) -> Option<String> {
    for entry in entries.iter().take(LABEL_SCAN) {
        match entry_type(entry) {
            Some("custom") => {
                let Some(data) = entry.get("data") else { continue };
                if data.to_string().contains("channel") {
                    let channel = str_field(data, "channel").unwrap_or_else(|| "unknown".to_string());
                    return Some(format!("Session via {channel}"));
                }
            }
            Some("message") if role(entry) == Some("user") => {
                let first_is_text = entry
                    .pointer("/message/content/0/type")
                    .and_then(|v| v.as_str())
                    == Some("text");
                if first_is_text {
                    let text = entry
                        .pointer("/message/content/0/text")
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    let head: String = text.chars().take(LABEL_MAX).collect();
                    let first = head.lines().next().unwrap_or("");
                    return (!first.trim().is_empty()).then(|| first.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Most recent model and channel announced in the session preamble.
fn model_and_channel(entries: &[Value]) -> (Option<String>, Option<String>) {
    let mut model = None;
    let mut channel = None;
    for entry in entries.iter().take(HEADER_SCAN) {
        match entry_type(entry) {
            Some("model_change") => {
                if let Some(m) = str_field(entry, "modelId") {
                    model = Some(m);
                }
            }
            Some("custom") => {
                if let Some(c) = entry.get("data").and_then(|d| str_field(d, "channel")) {
                    channel = Some(c);
                }
            }
            _ => {}
        }
    }
    (model, channel)
}

/// Actions of one session, each linked to its predecessor.
struct ActionChain {
    session_id: String,
    previous: Option<String>,
    actions: usize,
    tool_calls: usize,
}

impl ActionChain {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            previous: None,
            actions: 0,
            tool_calls: 0,
        }
    }

    fn push(&mut self, builder: &mut GraphBuilder, id: String, info: ActionInfo) {
        builder.add_node(Node::action(id.clone(), info));
        builder.add_edge(Edge::new(self.session_id.clone(), id.clone(), Relation::Contains));
        if let Some(previous) = self.previous.replace(id.clone()) {
            if previous != id {
                builder.add_edge(Edge::new(previous, id, Relation::FollowedBy));
            }
        }
        self.actions += 1;
    }
}

fn action_info(action_type: &str, name: Option<String>, timestamp: Option<String>, details: Option<Value>) -> ActionInfo {
    ActionInfo {
        action_type: Some(action_type.to_string()),
        name,
        timestamp,
        details,
    }
}

/// Turn one log entry into zero or more actions.
fn record_actions(entry: &Value, chain: &mut ActionChain, builder: &mut GraphBuilder) {
    let Some(entry_id) = str_field(entry, "id") else {
        return;
    };
    let timestamp = str_field(entry, "timestamp");

    match entry_type(entry) {
        Some("message") => match role(entry) {
            Some("assistant") => {
                let items = entry
                    .pointer("/message/content")
                    .and_then(|v| v.as_array())
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                for item in items {
                    if item.get("type").and_then(|v| v.as_str()) != Some("toolCall") {
                        continue;
                    }
                    let tool = str_field(item, "name").unwrap_or_else(|| "tool".to_string());
                    let details = json!({
                        "tool": tool,
                        "args_preview": args_preview(item.get("arguments")),
                    });
                    chain.push(
                        builder,
                        format!("{entry_id}:{tool}"),
                        action_info("tool_call", Some(tool), timestamp.clone(), Some(details)),
                    );
                    chain.tool_calls += 1;
                }

                if entry.pointer("/message/stopReason").and_then(|v| v.as_str()) == Some("stop") {
                    let details = json!({
                        "model": entry.pointer("/message/model").cloned().unwrap_or(Value::Null),
                        "tokens": entry.pointer("/message/usage/totalTokens").cloned().unwrap_or(Value::Null),
                        "cost": entry.pointer("/message/usage/cost/total").cloned().unwrap_or(Value::Null),
                    });
                    chain.push(
                        builder,
                        entry_id,
                        action_info("completion", Some("assistant_response".to_string()), timestamp, Some(details)),
                    );
                }
            }
            Some("user") => {
                chain.push(
                    builder,
                    entry_id,
                    action_info("user_message", Some("user_input".to_string()), timestamp, None),
                );
            }
            Some("toolResult") => {
                let is_error = entry
                    .pointer("/message/isError")
                    .or_else(|| entry.get("isError"))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                let name = entry
                    .get("message")
                    .and_then(|m| str_field(m, "toolName"));
                chain.push(
                    builder,
                    entry_id,
                    action_info("tool_result", name, timestamp, Some(json!({"is_error": is_error}))),
                );
            }
            _ => {}
        },
        Some("model_change") => {
            let details = json!({"provider": entry.get("provider").cloned().unwrap_or(Value::Null)});
            chain.push(
                builder,
                entry_id,
                action_info("model_change", str_field(entry, "modelId"), timestamp, Some(details)),
            );
        }
        Some("thinking_level_change") => {
            chain.push(
                builder,
                entry_id,
                action_info("thinking_change", str_field(entry, "thinkingLevel"), timestamp, None),
            );
        }
        _ => {}
    }
}

fn args_preview(arguments: Option<&Value>) -> String {
    let text = match arguments {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    text.chars().take(ARGS_PREVIEW_MAX).collect()
}

#[cfg(test)]
#[path = "../../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
