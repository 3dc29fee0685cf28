//! Activity statistics for a graph snapshot.
//!
//! Counts agents, sessions and actions, aggregates tool usage and lists the
//! most recent sessions. Formatters turn a [`StatsReport`] into text.
//! [`SessionDetail`] is the timeline of a single session.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::graph::{NodeData, RawGraph, Relation};

const TOOL_CALL: &str = "tool_call";
const SUBAGENT: &str = "subagent";

/// Actions listed in a session timeline.
pub const TIMELINE_LIMIT: usize = 50;
/// Characters of a details payload shown per timeline entry.
const TIMELINE_DETAILS_MAX: usize = 100;

/// Headline counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub total_sessions: usize,
    pub total_actions: usize,
    pub total_tool_calls: usize,
    /// Agents not marked as subagents.
    pub main_agents: usize,
    pub subagents: usize,
}

/// Usage of a single tool across all sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUsage {
    pub tool: String,
    pub count: usize,
    /// Latest timestamp seen for this tool, as written by the provider.
    pub last_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub label: String,
    pub model: Option<String>,
    pub started_at: Option<String>,
    pub action_count: usize,
}

/// Complete statistics for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsReport {
    pub stats: GraphStats,
    pub tools: Vec<ToolUsage>,
    pub recent_sessions: Vec<SessionSummary>,
}

impl StatsReport {
    /// Build a report, keeping at most `recent_limit` sessions.
    pub fn from_graph(graph: &RawGraph, recent_limit: usize) -> Self {
        let mut stats = GraphStats::default();
        let mut tools: HashMap<&str, ToolUsage> = HashMap::new();
        let mut sessions = Vec::new();

        for node in &graph.nodes {
            match &node.data {
                NodeData::Agent(info) => {
                    if info.agent_type.as_deref() == Some(SUBAGENT) {
                        stats.subagents += 1;
                    } else {
                        stats.main_agents += 1;
                    }
                }
                NodeData::Session(info) => {
                    stats.total_sessions += 1;
                    sessions.push(SessionSummary {
                        id: node.id.clone(),
                        label: info
                            .name
                            .clone()
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| node.id.clone()),
                        model: info.model.clone(),
                        started_at: info.started_at.clone(),
                        action_count: 0,
                    });
                }
                NodeData::Action(info) => {
                    stats.total_actions += 1;
                    if info.action_type.as_deref() != Some(TOOL_CALL) {
                        continue;
                    }
                    stats.total_tool_calls += 1;
                    let tool = info.name.as_deref().unwrap_or("unknown");
                    let usage = tools.entry(tool).or_insert_with(|| ToolUsage {
                        tool: tool.to_string(),
                        count: 0,
                        last_used: None,
                    });
                    usage.count += 1;
                    // ISO-8601 strings in a common format sort chronologically.
                    if info.timestamp > usage.last_used {
                        usage.last_used = info.timestamp.clone();
                    }
                }
            }
        }

        let mut contained: HashMap<&str, usize> = HashMap::new();
        for edge in graph.edges.iter().filter(|e| e.relation == Relation::Contains) {
            *contained.entry(edge.source.as_str()).or_default() += 1;
        }
        for session in &mut sessions {
            session.action_count = contained.get(session.id.as_str()).copied().unwrap_or(0);
        }

        let mut tools: Vec<ToolUsage> = tools.into_values().collect();
        tools.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tool.cmp(&b.tool)));

        // Newest first; sessions without a start time go last.
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at).then_with(|| a.id.cmp(&b.id)));
        sessions.truncate(recent_limit);

        Self {
            stats,
            tools,
            recent_sessions: sessions,
        }
    }
}

/// One action in a session timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub id: String,
    pub action_type: Option<String>,
    pub name: Option<String>,
    pub timestamp: Option<String>,
    /// Details payload as text, truncated.
    pub details: Option<String>,
}

impl TimelineEntry {
    /// `type: name`, or whichever of the two is present.
    pub fn heading(&self) -> String {
        match (self.action_type.as_deref(), self.name.as_deref()) {
            (Some(t), Some(n)) => format!("{t}: {n}"),
            (Some(only), None) | (None, Some(only)) => only.to_string(),
            (None, None) => self.id.clone(),
        }
    }
}

/// A session with its metadata and actions in timestamp order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDetail {
    pub id: String,
    pub label: Option<String>,
    /// Display name (or id) of the agent that owns the session.
    pub agent: Option<String>,
    pub model: Option<String>,
    pub channel: Option<String>,
    pub started_at: Option<String>,
    /// Every action the session contains.
    pub total_actions: usize,
    /// The earliest `limit` actions; untimed actions sort last.
    pub timeline: Vec<TimelineEntry>,
}

impl SessionDetail {
    /// Look up `session_id` and collect its contained actions. `None` if no
    /// session node has that id.
    pub fn from_graph(graph: &RawGraph, session_id: &str, limit: usize) -> Option<Self> {
        let (id, info) = graph.nodes.iter().find_map(|n| match &n.data {
            NodeData::Session(info) if n.id == session_id => Some((&n.id, info)),
            _ => None,
        })?;

        let agent = graph
            .edges
            .iter()
            .find(|e| e.relation == Relation::HasSession && e.target == session_id)
            .map(|e| {
                graph
                    .node(&e.source)
                    .and_then(|n| n.display_name())
                    .filter(|n| !n.is_empty())
                    .unwrap_or(e.source.as_str())
                    .to_string()
            });

        let mut seen = HashSet::new();
        let mut entries: Vec<TimelineEntry> = graph
            .edges
            .iter()
            .filter(|e| e.relation == Relation::Contains && e.source == session_id)
            .filter(|e| seen.insert(e.target.as_str()))
            .filter_map(|e| match graph.node(&e.target).map(|n| &n.data) {
                Some(NodeData::Action(action)) => Some(TimelineEntry {
                    id: e.target.clone(),
                    action_type: action.action_type.clone(),
                    name: action.name.clone().filter(|n| !n.is_empty()),
                    timestamp: action.timestamp.clone(),
                    details: action.details.as_ref().and_then(details_preview),
                }),
                _ => None,
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.timestamp.is_none(), &a.timestamp).cmp(&(b.timestamp.is_none(), &b.timestamp))
        });

        let total_actions = entries.len();
        entries.truncate(limit);
        Some(Self {
            id: id.clone(),
            label: info.name.clone().filter(|n| !n.is_empty()),
            agent,
            model: info.model.clone(),
            channel: info.channel.clone(),
            started_at: info.started_at.clone(),
            total_actions,
            timeline: entries,
        })
    }

    /// Label, or a shortened id when the session has none.
    pub fn title(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("Session {}...", self.id.chars().take(8).collect::<String>()),
        }
    }

    /// Actions left out of the timeline.
    pub fn hidden_actions(&self) -> usize {
        self.total_actions - self.timeline.len()
    }
}

fn details_preview(details: &Value) -> Option<String> {
    let text = match details {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    (!text.is_empty()).then(|| text.chars().take(TIMELINE_DETAILS_MAX).collect())
}

/// Trait for formatting stats reports.
/// Implement this trait to add new output formats.
pub trait StatsFormatter {
    fn format(&self, report: &StatsReport) -> String;
}

/// Plain-text report for terminal output.
#[derive(Debug, Clone)]
pub struct TextFormatter {
    /// Minimum width for the name columns.
    pub min_name_width: usize,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { min_name_width: 24 }
    }
}

impl StatsFormatter for TextFormatter {
    fn format(&self, report: &StatsReport) -> String {
        let mut output = String::new();
        let stats = &report.stats;

        output.push_str("Agent Activity\n");
        output.push_str(&format!(
            "Agents: {} main, {} subagent\n",
            stats.main_agents, stats.subagents
        ));
        output.push_str(&format!("Sessions: {}\n", stats.total_sessions));
        output.push_str(&format!(
            "Actions: {} ({} tool calls)\n",
            stats.total_actions, stats.total_tool_calls
        ));

        let tool_width = report
            .tools
            .iter()
            .map(|t| t.tool.chars().count())
            .max()
            .unwrap_or(0)
            .max(self.min_name_width);
        let separator = "─".repeat(tool_width + 36);

        output.push('\n');
        output.push_str(&separator);
        output.push('\n');
        output.push_str(&format!("{:<width$} {:>7}  {}\n", "Tool", "Calls", "Last used", width = tool_width));
        output.push_str(&separator);
        output.push('\n');
        if report.tools.is_empty() {
            output.push_str("(no tool calls)\n");
        }
        for tool in &report.tools {
            output.push_str(&format!(
                "{:<width$} {:>7}  {}\n",
                tool.tool,
                tool.count,
                tool.last_used.as_deref().unwrap_or("-"),
                width = tool_width
            ));
        }

        let label_width = report
            .recent_sessions
            .iter()
            .map(|s| s.label.chars().count())
            .max()
            .unwrap_or(0)
            .clamp(self.min_name_width, 50);
        let separator = "─".repeat(label_width + 60);

        output.push('\n');
        output.push_str(&separator);
        output.push('\n');
        output.push_str(&format!(
            "{:<width$} {:>7}  {:<24} {}\n",
            "Session",
            "Actions",
            "Started",
            "Model",
            width = label_width
        ));
        output.push_str(&separator);
        output.push('\n');
        if report.recent_sessions.is_empty() {
            output.push_str("(no sessions)\n");
        }
        for session in &report.recent_sessions {
            let label: String = session.label.chars().take(label_width).collect();
            output.push_str(&format!(
                "{:<width$} {:>7}  {:<24} {}\n",
                label,
                session.action_count,
                session.started_at.as_deref().unwrap_or("-"),
                session.model.as_deref().unwrap_or("-"),
                width = label_width
            ));
        }

        output
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;

#[cfg(test)]
mod tests {
    use super::helpers::*;
    use super::*;

    fn sample() -> RawGraph {
        graph(
            vec![
                agent_of_type("main", "main"),
                agent_of_type("subagent:1", "subagent"),
                agent("legacy"),
                session_at("s-old", "2025-01-01T09:00:00Z"),
                session_at("s-new", "2025-01-02T09:00:00Z"),
                session("s-undated"),
                tool_action("t1", "exec", "2025-01-01T09:00:01Z"),
                tool_action("t2", "read", "2025-01-01T09:00:02Z"),
                tool_action("t3", "exec", "2025-01-02T09:00:03Z"),
                action("u1", "user_message"),
            ],
            vec![
                edge("s-old", "t1", "CONTAINS"),
                edge("s-old", "t2", "CONTAINS"),
                edge("s-new", "t3", "CONTAINS"),
                edge("s-new", "u1", "CONTAINS"),
                edge("s-new", "u1", "FOLLOWED_BY"),
            ],
        )
    }

    #[test]
    fn counts_nodes_by_kind() {
        let report = StatsReport::from_graph(&sample(), 20);
        assert_eq!(
            report.stats,
            GraphStats {
                total_sessions: 3,
                total_actions: 4,
                total_tool_calls: 3,
                main_agents: 2,
                subagents: 1,
            }
        );
    }

    #[test]
    fn tool_usage_sorted_by_count_then_name() {
        let report = StatsReport::from_graph(&sample(), 20);
        let tools: Vec<(&str, usize)> = report.tools.iter().map(|t| (t.tool.as_str(), t.count)).collect();
        assert_eq!(tools, vec![("exec", 2), ("read", 1)]);
        assert_eq!(report.tools[0].last_used.as_deref(), Some("2025-01-02T09:00:03Z"));
    }

    #[test]
    fn recent_sessions_newest_first_with_action_counts() {
        let report = StatsReport::from_graph(&sample(), 20);
        let ids: Vec<&str> = report.recent_sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s-new", "s-old", "s-undated"]);
        assert_eq!(report.recent_sessions[0].action_count, 2);
        assert_eq!(report.recent_sessions[1].action_count, 2);
        assert_eq!(report.recent_sessions[2].action_count, 0);
        assert_eq!(report.recent_sessions[2].label, "s-undated");
    }

    #[test]
    fn recent_sessions_respect_limit() {
        let report = StatsReport::from_graph(&sample(), 1);
        assert_eq!(report.recent_sessions.len(), 1);
        assert_eq!(report.recent_sessions[0].id, "s-new");
    }

    #[test]
    fn empty_graph_report() {
        let report = StatsReport::from_graph(&RawGraph::default(), 20);
        assert_eq!(report, StatsReport::default());
        let text = TextFormatter::default().format(&report);
        assert!(text.contains("(no tool calls)"));
        assert!(text.contains("(no sessions)"));
    }

    #[test]
    fn blank_session_name_lists_id() {
        let g = graph(vec![named_session("s1", "")], Vec::new());
        let report = StatsReport::from_graph(&g, 20);
        assert_eq!(report.recent_sessions[0].label, "s1");
    }

    #[test]
    fn session_detail_orders_actions_by_time() {
        let mut g = sample();
        g.nodes.push(agent_of_type("owner", "main"));
        g.edges.push(edge("owner", "s-new", "HAS_SESSION"));
        g.edges.push(edge("s-new", "t3", "CONTAINS"));
        g.nodes.push(tool_action("t0", "grep", "2025-01-02T08:59:59Z"));
        g.edges.push(edge("s-new", "t0", "CONTAINS"));

        let detail = SessionDetail::from_graph(&g, "s-new", TIMELINE_LIMIT).unwrap();
        assert_eq!(detail.agent.as_deref(), Some("owner"));
        assert_eq!(detail.started_at.as_deref(), Some("2025-01-02T09:00:00Z"));
        let ids: Vec<&str> = detail.timeline.iter().map(|e| e.id.as_str()).collect();
        // Untimed actions go last; duplicate containment is listed once.
        assert_eq!(ids, vec!["t0", "t3", "u1"]);
        assert_eq!(detail.timeline[1].heading(), "tool_call: exec");
        assert_eq!(detail.timeline[2].heading(), "user_message");
        assert_eq!(detail.hidden_actions(), 0);
        assert_eq!(detail.title(), "Session s-new...");
    }

    #[test]
    fn session_detail_caps_timeline() {
        let mut nodes = vec![named_session("s1", "Busy")];
        let mut edges = Vec::new();
        for i in 0..60 {
            let id = format!("t{i:02}");
            nodes.push(tool_action(&id, "exec", &format!("2025-01-01T10:00:{i:02}Z")));
            edges.push(edge("s1", &id, "CONTAINS"));
        }
        let detail = SessionDetail::from_graph(&graph(nodes, edges), "s1", TIMELINE_LIMIT).unwrap();
        assert_eq!(detail.total_actions, 60);
        assert_eq!(detail.timeline.len(), 50);
        assert_eq!(detail.timeline[0].id, "t00");
        assert_eq!(detail.hidden_actions(), 10);
        assert_eq!(detail.title(), "Busy");
        assert_eq!(detail.agent, None);
    }

    #[test]
    fn session_detail_truncates_details_and_rejects_unknown_ids() {
        let g = graph(
            vec![session("s1"), action_with_details("x", serde_json::json!("d".repeat(150)))],
            vec![edge("s1", "x", "CONTAINS")],
        );
        let detail = SessionDetail::from_graph(&g, "s1", TIMELINE_LIMIT).unwrap();
        assert_eq!(detail.timeline[0].details.as_deref(), Some("d".repeat(100).as_str()));
        assert!(SessionDetail::from_graph(&g, "x", TIMELINE_LIMIT).is_none());
        assert!(SessionDetail::from_graph(&g, "nope", TIMELINE_LIMIT).is_none());
    }

    #[test]
    fn text_formatter_lists_tools_and_sessions() {
        let report = StatsReport::from_graph(&sample(), 20);
        let text = TextFormatter::default().format(&report);
        assert!(text.contains("Agents: 2 main, 1 subagent"));
        assert!(text.contains("Actions: 4 (3 tool calls)"));
        let exec = text.lines().find(|l| l.starts_with("exec")).unwrap();
        assert!(exec.contains("2025-01-02T09:00:03Z"));
        assert!(text.lines().any(|l| l.starts_with("s-new")));
    }
}
