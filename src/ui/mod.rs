pub mod colors;
pub mod detail;
pub mod graph_view;
pub mod sessions;
pub mod stats;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use agentviz::app::App;

pub fn render(f: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),       // top: graph + stats
            Constraint::Length(8),     // bottom: recent sessions
            Constraint::Length(1),     // status bar
        ])
        .split(f.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(62),  // graph
            Constraint::Percentage(38),  // stats
        ])
        .split(outer[0]);

    match &app.detail {
        Some(session) => detail::render(f, session, &app.config.labels.time_format, top[0]),
        None => graph_view::render(f, app, top[0]),
    }
    stats::render(f, app, top[1]);
    sessions::render(f, app, outer[1]);
    render_status_bar(f, app, outer[2]);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Gray));
    let toggle = |on: bool| if on { "on " } else { "off " };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(app.source_name.as_str(), Style::default().fg(colors::HIGHLIGHT_FG)),
        Span::raw("  "),
        key("[q]"),
        Span::raw("uit "),
        key("[j/k]"),
        Span::raw("nav "),
        key("[h/l]"),
        Span::raw("expand "),
        key("[r]"),
        Span::raw("efresh "),
        key("[s]"),
        Span::raw("essions:"),
        Span::raw(toggle(app.filter.show_sessions)),
        key("[a]"),
        Span::raw("ctions:"),
        Span::raw(toggle(app.filter.show_actions)),
        key("[tab]"),
        Span::raw("focus "),
    ];
    if app.detail.is_some() {
        spans.push(key("[esc]"));
        spans.push(Span::raw("close "));
    }

    if let Some(at) = app.last_refresh {
        spans.push(Span::raw(format!(" updated {}", at.format("%H:%M:%S"))));
    }
    if let Some(err) = &app.last_error {
        spans.push(Span::styled(format!("  ✗ {err}"), Style::default().fg(colors::ERROR)));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        area,
    );
}
