use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::AppConfig;
use crate::filter::{self, GraphFilter};
use crate::graph::{NodeId, NodeKind, RawGraph};
use crate::layout::{self, Layout};
use crate::stats::{SessionDetail, StatsReport, TIMELINE_LIMIT};

/// Separator used when a multi-line label is shown on one row.
const LABEL_JOIN: &str = " │ ";

/// A flattened row in the graph view, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRow {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub level: usize,
    /// First label line.
    pub title: String,
    /// Remaining label lines, joined.
    pub detail: Option<String>,
    pub has_children: bool,
    pub is_expanded: bool,
}

/// Which panel is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPanel {
    Graph,
    Stats,
    Sessions,
}

pub struct App {
    /// Where the graph comes from, for the title bar.
    pub source_name: String,
    pub config: AppConfig,
    pub should_quit: bool,
    /// Set by the refresh key; the event loop reloads and clears it.
    pub refresh_requested: bool,

    /// Last snapshot as loaded, before filtering.
    pub graph: RawGraph,
    pub filter: GraphFilter,
    /// Filtered snapshot the layout was computed from.
    pub view: RawGraph,
    pub layout: Layout,
    pub report: StatsReport,
    pub last_error: Option<String>,
    pub last_refresh: Option<DateTime<Local>>,

    // Graph view state.
    pub rows: Vec<GraphRow>,
    pub selected_index: usize,
    pub collapsed: HashSet<NodeId>,

    // Recent sessions list state.
    pub session_index: usize,
    /// Session whose timeline is open over the graph panel.
    pub detail: Option<SessionDetail>,

    pub focus: FocusPanel,
}

impl App {
    pub fn new(source_name: impl Into<String>, config: AppConfig, filter: GraphFilter) -> Self {
        Self {
            source_name: source_name.into(),
            config,
            should_quit: false,
            refresh_requested: false,
            graph: RawGraph::default(),
            filter,
            view: RawGraph::default(),
            layout: Layout::Empty,
            report: StatsReport::default(),
            last_error: None,
            last_refresh: None,
            rows: Vec::new(),
            selected_index: 0,
            collapsed: HashSet::new(),
            session_index: 0,
            detail: None,
            focus: FocusPanel::Graph,
        }
    }

    /// Replace the snapshot and recompute everything derived from it.
    pub fn set_graph(&mut self, graph: RawGraph) {
        self.graph = graph;
        self.last_error = None;
        self.last_refresh = Some(Local::now());
        self.recompute();
    }

    /// Keep the previous snapshot on screen and report why the reload failed.
    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!(error = message.as_str(); "Graph reload failed");
        self.last_error = Some(message);
    }

    /// Re-run filter, layout and stats over the current snapshot.
    pub fn recompute(&mut self) {
        let limited = filter::newest_actions(&self.graph, self.config.ui.graph_limit);
        self.view = self.filter.apply(&limited);
        self.layout = layout::compute(&self.view, &self.config.labels);
        self.report = StatsReport::from_graph(&self.graph, self.config.ui.recent_sessions);
        self.session_index = self
            .session_index
            .min(self.report.recent_sessions.len().saturating_sub(1));
        if let Some(id) = self.detail.as_ref().map(|d| d.id.clone()) {
            self.detail = SessionDetail::from_graph(&self.graph, &id, TIMELINE_LIMIT);
        }
        log::debug!(
            nodes = self.view.nodes.len(),
            empty = self.layout.is_empty();
            "Recomputed layout"
        );
        self.rebuild_rows();
    }

    /// Rebuild the flattened rows from the layout + collapsed state,
    /// keeping the selection on the same node where possible.
    pub fn rebuild_rows(&mut self) {
        let selected = self.selected_node().map(str::to_string);
        self.rows = build_rows(&self.view, &self.layout, &self.collapsed);
        self.selected_index = selected
            .and_then(|id| self.rows.iter().position(|r| r.node_id == id))
            .unwrap_or(self.selected_index)
            .min(self.rows.len().saturating_sub(1));
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.rows.get(self.selected_index).map(|r| r.node_id.as_str())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter => match self.focus {
                FocusPanel::Graph => self.toggle_expand(),
                FocusPanel::Sessions => self.open_session(),
                FocusPanel::Stats => {}
            },
            KeyCode::Char('h') | KeyCode::Left => match self.focus {
                FocusPanel::Graph => self.collapse_current(),
                FocusPanel::Sessions => self.detail = None,
                FocusPanel::Stats => {}
            },
            KeyCode::Esc => self.detail = None,
            KeyCode::Char('G') => self.select_last(),
            KeyCode::Char('g') => self.select_first(),
            KeyCode::Char('r') => self.refresh_requested = true,
            KeyCode::Char('s') => {
                self.filter.show_sessions = !self.filter.show_sessions;
                self.recompute();
            }
            KeyCode::Char('a') => {
                self.filter.show_actions = !self.filter.show_actions;
                self.recompute();
            }
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::PageDown => self.move_selection(20),
            KeyCode::PageUp => self.move_selection(-20),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: i32) {
        let (index, len) = match self.focus {
            FocusPanel::Graph => (&mut self.selected_index, self.rows.len()),
            FocusPanel::Sessions => (&mut self.session_index, self.report.recent_sessions.len()),
            FocusPanel::Stats => return,
        };
        if len == 0 {
            return;
        }
        let new_idx = *index as i64 + delta as i64;
        *index = new_idx.clamp(0, len as i64 - 1) as usize;
    }

    fn select_first(&mut self) {
        match self.focus {
            FocusPanel::Graph => self.selected_index = 0,
            FocusPanel::Sessions => self.session_index = 0,
            FocusPanel::Stats => {}
        }
    }

    fn select_last(&mut self) {
        match self.focus {
            FocusPanel::Graph => self.selected_index = self.rows.len().saturating_sub(1),
            FocusPanel::Sessions => {
                self.session_index = self.report.recent_sessions.len().saturating_sub(1)
            }
            FocusPanel::Stats => {}
        }
    }

    fn toggle_expand(&mut self) {
        if let Some(row) = self.rows.get(self.selected_index) {
            if row.has_children {
                let id = row.node_id.clone();
                if !self.collapsed.remove(&id) {
                    self.collapsed.insert(id);
                }
                self.rebuild_rows();
            }
        }
    }

    fn collapse_current(&mut self) {
        if let Some(row) = self.rows.get(self.selected_index) {
            if row.has_children && row.is_expanded {
                self.collapsed.insert(row.node_id.clone());
                self.rebuild_rows();
            }
        }
    }

    /// Show the timeline of the session selected in the recent-sessions list.
    fn open_session(&mut self) {
        let Some(summary) = self.report.recent_sessions.get(self.session_index) else {
            return;
        };
        self.detail = SessionDetail::from_graph(&self.graph, &summary.id, TIMELINE_LIMIT);
        log::debug!(session = summary.id.as_str(); "Opened session detail");
    }

    fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPanel::Graph => FocusPanel::Stats,
            FocusPanel::Stats => FocusPanel::Sessions,
            FocusPanel::Sessions => FocusPanel::Graph,
        };
    }
}

/// Depth-first walk over the display edges, starting from nodes nothing
/// points at, in node order. Every node appears once; nodes only reachable
/// through a cycle become roots of their own.
pub fn build_rows(view: &RawGraph, layout: &Layout, collapsed: &HashSet<NodeId>) -> Vec<GraphRow> {
    let Some(result) = layout.result() else {
        return Vec::new();
    };

    let kinds: HashMap<&str, NodeKind> = view.nodes.iter().map(|n| (n.id.as_str(), n.kind())).collect();
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut has_parent: HashSet<&str> = HashSet::new();
    for edge in &result.display_edges {
        children.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        has_parent.insert(edge.target.as_str());
    }

    let ids = || result.levels.keys().map(String::as_str);
    let mut roots: Vec<&str> = ids().filter(|id| !has_parent.contains(id)).collect();

    // Nodes only reachable through a cycle start their own subtree; the
    // reachability walk ignores collapse state.
    let mut reachable: HashSet<&str> = HashSet::new();
    let mut pending = roots.clone();
    for id in ids() {
        while let Some(next) = pending.pop() {
            if reachable.insert(next) {
                pending.extend(children.get(next).into_iter().flatten().copied());
            }
        }
        if !reachable.contains(id) {
            roots.push(id);
            pending.push(id);
        }
    }

    let mut rows = Vec::with_capacity(result.levels.len());
    let mut visited: HashSet<&str> = HashSet::new();
    for root in roots {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let kids = children.get(id).map(Vec::as_slice).unwrap_or_default();
            let is_expanded = !collapsed.contains(id);
            let label = result.label_of(id).unwrap_or(id);
            let mut lines = label.lines();
            let title = lines.next().unwrap_or("").to_string();
            let rest: Vec<&str> = lines.collect();

            rows.push(GraphRow {
                node_id: id.to_string(),
                kind: kinds.get(id).copied().unwrap_or(NodeKind::Action),
                level: result.level_of(id).unwrap_or(0),
                title,
                detail: (!rest.is_empty()).then(|| rest.join(LABEL_JOIN)),
                has_children: !kids.is_empty(),
                is_expanded,
            });

            if is_expanded {
                stack.extend(kids.iter().rev().filter(|k| !visited.contains(*k)));
            }
        }
    }
    rows
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
