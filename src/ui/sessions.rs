use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use agentviz::app::{App, FocusPanel};
use agentviz::layout::labels::{format_time_of_day, truncate};
use agentviz::stats::SessionSummary;

use super::colors;

const LABEL_WIDTH: usize = 40;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == FocusPanel::Sessions;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .title(" Recent Sessions ")
        .borders(Borders::ALL)
        .border_style(border_style);

    if app.report.recent_sessions.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  No sessions yet",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let time_format = app.config.labels.time_format.as_str();
    let items: Vec<ListItem> = app
        .report
        .recent_sessions
        .iter()
        .map(|s| ListItem::new(session_line(s, time_format)))
        .collect();

    let mut state = ListState::default();
    if focused {
        state.select(Some(app.session_index));
    }

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(colors::HIGHLIGHT_BG)
            .fg(colors::HIGHLIGHT_FG)
            .add_modifier(Modifier::BOLD),
    );
    f.render_stateful_widget(list, area, &mut state);
}

fn session_line<'a>(session: &'a SessionSummary, time_format: &str) -> Line<'a> {
    let started = session
        .started_at
        .as_deref()
        .and_then(|ts| format_time_of_day(ts, time_format))
        .unwrap_or_else(|| "--:--:--".to_string());

    let mut spans = vec![
        Span::styled(format!(" {started} "), Style::default().fg(colors::ACCENT_MUTED)),
        Span::styled(
            format!("{:<width$}", truncate(&session.label, LABEL_WIDTH), width = LABEL_WIDTH),
            Style::default().fg(colors::KIND_SESSION),
        ),
        Span::styled(
            format!(" {:>4} actions", session.action_count),
            Style::default().fg(Color::White),
        ),
    ];
    if let Some(model) = &session.model {
        spans.push(Span::styled(format!("  {model}"), Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}
