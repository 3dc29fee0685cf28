//! Multi-line node labels.
//!
//! Label synthesis never fails. Action metadata is interpreted through an
//! ordered list of extraction steps; the first one that yields a record wins,
//! and if none does the raw payload is shown truncated.

use std::fmt::Write;

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use crate::config::LabelConfig;
use crate::graph::{ActionInfo, AgentInfo, Node, NodeData, SessionInfo};

const CHANNEL_SEPARATOR: &str = " · ";
const EMPTY_RECORD: &str = "{}";

pub fn synthesize(node: &Node, config: &LabelConfig) -> String {
    match &node.data {
        NodeData::Agent(info) => agent_label(&node.id, info),
        NodeData::Session(info) => session_label(&node.id, info, config),
        NodeData::Action(info) => action_label(&node.id, info, config),
    }
}

fn agent_label(id: &str, info: &AgentInfo) -> String {
    non_empty(info.name.as_deref()).unwrap_or(id).to_string()
}

fn session_label(id: &str, info: &SessionInfo, config: &LabelConfig) -> String {
    let mut label = truncate(non_empty(info.name.as_deref()).unwrap_or(id), config.session_name_max);
    if let Some(model) = &info.model {
        label.push('\n');
        label.push_str(model);
    }
    if let Some(channel) = &info.channel {
        label.push_str(CHANNEL_SEPARATOR);
        label.push_str(channel);
    }
    label
}

fn action_label(id: &str, info: &ActionInfo, config: &LabelConfig) -> String {
    let subtype = info.action_type.as_deref().unwrap_or("");
    let name = match non_empty(info.name.as_deref()) {
        Some(name) => name,
        None if !subtype.is_empty() => subtype,
        None => id,
    };

    let mut lines = Vec::with_capacity(3);
    lines.push(if subtype.is_empty() || subtype == name {
        name.to_string()
    } else {
        format!("{subtype}: {name}")
    });

    if let Some(details) = info.details.as_ref().filter(|d| !is_blank(d)) {
        match interpret_details(details) {
            Some(record) => {
                if let Some(tool) = record.get("tool").and_then(scalar_text) {
                    lines[0] = tool;
                }
                if let Some(args) = record.get("args_preview").and_then(scalar_text) {
                    lines.push(truncate(&args, config.args_preview_max));
                }
            }
            None if is_unparseable(details) => {
                let raw = truncate(&raw_text(details), config.details_max);
                if !raw.is_empty() && raw != EMPTY_RECORD {
                    lines.push(raw);
                }
            }
            None => {}
        }
    }

    if let Some(time) = info
        .timestamp
        .as_deref()
        .and_then(|ts| format_time_of_day(ts, &config.time_format))
    {
        lines.push(time);
    }

    lines.join("\n")
}

type Extraction = fn(&Value) -> Option<Map<String, Value>>;

/// Interpretations of a details payload, highest fidelity first.
const DETAIL_EXTRACTIONS: &[Extraction] = &[structured_record, quoted_record];

/// The first record any extraction step can produce, if any.
pub fn interpret_details(details: &Value) -> Option<Map<String, Value>> {
    DETAIL_EXTRACTIONS.iter().find_map(|step| step(details))
}

/// Payload is already a record.
fn structured_record(details: &Value) -> Option<Map<String, Value>> {
    details.as_object().cloned()
}

/// Payload is a string holding a record, possibly written with single quotes
/// (a Python `str(dict)`).
fn quoted_record(details: &Value) -> Option<Map<String, Value>> {
    let normalized = details.as_str()?.replace('\'', "\"");
    match serde_json::from_str::<Value>(&normalized) {
        Ok(Value::Object(record)) => Some(record),
        _ => None,
    }
}

/// Text that is not JSON even after quote normalization. Values that parse
/// but are not records add nothing to the label.
fn is_unparseable(details: &Value) -> bool {
    match details.as_str() {
        Some(text) => serde_json::from_str::<Value>(&text.replace('\'', "\"")).is_err(),
        None => false,
    }
}

fn non_empty(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty())
}

fn raw_text(details: &Value) -> String {
    match details {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
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

/// Keep at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Time of day of an ISO-8601 timestamp, in the timestamp's own offset.
/// Timestamps without an offset are taken as written.
pub fn format_time_of_day(timestamp: &str, pattern: &str) -> Option<String> {
    let mut out = String::new();
    let written = if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        write!(out, "{}", dt.format(pattern))
    } else {
        let naive = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?;
        write!(out, "{}", naive.format(pattern))
    };
    // An invalid pattern surfaces as a formatting error rather than a panic.
    written.ok().map(|_| out)
}
