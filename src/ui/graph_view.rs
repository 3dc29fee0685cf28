use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use agentviz::app::{App, FocusPanel, GraphRow};
use agentviz::graph::NodeKind;

use super::colors;

/// Levels beyond this share one indentation.
const MAX_INDENT: usize = 16;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == FocusPanel::Graph {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let title = match app.layout.result() {
        Some(result) => format!(
            " Activity Graph ({} nodes, depth {}) ",
            result.levels.len(),
            result.depth()
        ),
        None => " Activity Graph ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    if app.layout.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  No graph data available yet",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app.rows.iter().map(row_line).map(ListItem::new).collect();

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(colors::HIGHLIGHT_BG)
            .fg(colors::HIGHLIGHT_FG)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(list, area, &mut state);
}

fn row_line(row: &GraphRow) -> Line<'_> {
    let indent = "  ".repeat(row.level.min(MAX_INDENT));
    let icon = if !row.has_children {
        "  "
    } else if row.is_expanded {
        "▾ "
    } else {
        "▸ "
    };

    let mut title_style = Style::default().fg(kind_color(row.kind));
    if row.kind == NodeKind::Agent {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }

    let mut spans = vec![
        Span::raw(indent),
        Span::styled(icon, Style::default().fg(Color::DarkGray)),
        Span::styled(row.title.as_str(), title_style),
    ];
    if let Some(detail) = &row.detail {
        spans.push(Span::styled(format!("  {detail}"), Style::default().fg(colors::DETAIL)));
    }
    Line::from(spans)
}

fn kind_color(kind: NodeKind) -> Color {
    match kind {
        NodeKind::Agent => colors::KIND_AGENT,
        NodeKind::Session => colors::KIND_SESSION,
        NodeKind::Action => colors::KIND_ACTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentviz::config::AppConfig;
    use agentviz::filter::GraphFilter;
    use agentviz::graph::{ActionInfo, AgentInfo, Edge, Node, RawGraph, Relation, SessionInfo};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn test_app(graph: RawGraph) -> App {
        let mut app = App::new("test", AppConfig::default(), GraphFilter::default());
        app.set_graph(graph);
        app
    }

    fn sample() -> RawGraph {
        RawGraph::new(
            vec![
                Node::agent("main", AgentInfo { name: Some("Main".into()), agent_type: None }),
                Node::session(
                    "s1",
                    SessionInfo {
                        name: Some("Fix build".into()),
                        model: Some("claude-opus".into()),
                        ..Default::default()
                    },
                ),
                Node::action(
                    "a1",
                    ActionInfo {
                        action_type: Some("tool_call".into()),
                        name: Some("exec".into()),
                        ..Default::default()
                    },
                ),
            ],
            vec![
                Edge::new("main", "s1", Relation::HasSession),
                Edge::new("s1", "a1", Relation::Contains),
            ],
        )
    }

    fn draw(app: &App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|f| render(f, app, f.area())).unwrap();
        terminal
    }

    fn row_text(backend: &TestBackend, row: u16) -> String {
        let buf = backend.buffer();
        (0..buf.area.width).map(|x| buf[(x, row)].symbol().to_string()).collect()
    }

    /// Find the foreground color of the first cell in `row` that contains part of `text`.
    fn fg_color_of(backend: &TestBackend, row: u16, text: &str) -> Option<Color> {
        let row_str = row_text(backend, row);
        let byte = row_str.find(text)?;
        let col = row_str[..byte].chars().count() as u16;
        Some(backend.buffer()[(col, row)].fg)
    }

    #[test]
    fn kind_color_variants() {
        assert_eq!(kind_color(NodeKind::Agent), colors::KIND_AGENT);
        assert_eq!(kind_color(NodeKind::Session), colors::KIND_SESSION);
        assert_eq!(kind_color(NodeKind::Action), colors::KIND_ACTION);
    }

    #[test]
    fn empty_layout_shows_placeholder() {
        let terminal = draw(&test_app(RawGraph::default()));
        assert!(row_text(terminal.backend(), 1).contains("No graph data available yet"));
    }

    #[test]
    fn rows_are_indented_by_level() {
        let mut app = test_app(sample());
        app.selected_index = 2;
        let terminal = draw(&app);
        let backend = terminal.backend();

        assert!(row_text(backend, 0).contains("3 nodes, depth 2"));
        let agent = row_text(backend, 1);
        let session = row_text(backend, 2);
        let action = row_text(backend, 3);
        assert!(agent.starts_with("│▾ Main"));
        assert!(session.starts_with("│  ▾ Fix build  claude-opus"));
        assert!(action.starts_with("│      tool_call: exec"));
        assert_eq!(fg_color_of(backend, 1, "Main"), Some(colors::KIND_AGENT));
        assert_eq!(fg_color_of(backend, 2, "Fix build"), Some(colors::KIND_SESSION));
    }

    #[test]
    fn selected_row_is_highlighted() {
        let mut app = test_app(sample());
        app.selected_index = 0;
        let terminal = draw(&app);
        assert_eq!(fg_color_of(terminal.backend(), 1, "Main"), Some(colors::HIGHLIGHT_FG));
    }
}
