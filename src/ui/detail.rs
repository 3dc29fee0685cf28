use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use agentviz::layout::labels::format_time_of_day;
use agentviz::stats::{SessionDetail, TimelineEntry};

use super::colors;

pub fn render(f: &mut Frame, detail: &SessionDetail, time_format: &str, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ", detail.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(detail_lines(detail, time_format))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn detail_lines<'a>(detail: &'a SessionDetail, time_format: &str) -> Vec<Line<'a>> {
    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!(" {name}: "), Style::default().fg(colors::ACCENT_MUTED)),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        field("ID", detail.id.clone()),
        field("Started", time_or_dash(detail.started_at.as_deref(), time_format)),
    ];
    if let Some(agent) = &detail.agent {
        lines.push(field("Agent", agent.clone()));
    }
    if let Some(model) = &detail.model {
        lines.push(field("Model", model.clone()));
    }
    if let Some(channel) = &detail.channel {
        lines.push(field("Channel", channel.clone()));
    }
    lines.push(field("Actions", detail.total_actions.to_string()));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        " Action Timeline",
        Style::default().add_modifier(Modifier::BOLD),
    )));

    for entry in &detail.timeline {
        lines.push(entry_line(entry, time_format));
        if let Some(details) = &entry.details {
            lines.push(Line::from(Span::styled(
                format!("            {details}"),
                Style::default().fg(colors::DETAIL),
            )));
        }
    }

    let hidden = detail.hidden_actions();
    if hidden > 0 {
        lines.push(Line::from(Span::styled(
            format!(" ... and {hidden} more actions"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn entry_line<'a>(entry: &TimelineEntry, time_format: &str) -> Line<'a> {
    let color = match entry.action_type.as_deref() {
        Some("tool_call") => colors::KIND_ACTION,
        Some("user_message") => colors::KIND_AGENT,
        _ => Color::White,
    };
    Line::from(vec![
        Span::styled(
            format!(" {:>9}  ", time_or_dash(entry.timestamp.as_deref(), time_format)),
            Style::default().fg(colors::ACCENT_MUTED),
        ),
        Span::styled(entry.heading(), Style::default().fg(color)),
    ])
}

fn time_or_dash(timestamp: Option<&str>, time_format: &str) -> String {
    timestamp
        .and_then(|ts| format_time_of_day(ts, time_format))
        .unwrap_or_else(|| "-".to_string())
}
