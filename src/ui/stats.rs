use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use agentviz::app::{App, FocusPanel};

use super::colors;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.focus == FocusPanel::Stats {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .title(" Stats ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let stats = &app.report.stats;
    let mut lines = vec![
        Line::from(""),
        stat_line("  Agents  ", stats.main_agents + stats.subagents, colors::KIND_AGENT),
        Line::from(Span::styled(
            format!("    {} main, {} subagent", stats.main_agents, stats.subagents),
            Style::default().fg(Color::DarkGray),
        )),
        stat_line("  Sessions", stats.total_sessions, colors::KIND_SESSION),
        stat_line("  Actions ", stats.total_actions, colors::KIND_ACTION),
        stat_line("  Tools   ", stats.total_tool_calls, colors::ACCENT_MUTED),
    ];

    if !app.report.tools.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Top tools",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));

        let room = (area.height as usize).saturating_sub(lines.len() + 2);
        for tool in app.report.tools.iter().take(room) {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:>5} ", tool.count), Style::default().fg(colors::ACCENT_MUTED)),
                Span::styled(tool.tool.as_str(), Style::default().fg(Color::White)),
            ]));
        }
    }

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, area);
}

fn stat_line(label: &str, count: usize, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{:>5}", count), Style::default().fg(color)),
    ])
}
