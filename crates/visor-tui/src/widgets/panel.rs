//! Bordered panel with a status word in the title bar.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use crate::theme;

/// Rounded block titled ` Title · status `.
pub fn block(title: &str, status: Option<&str>, focused: bool) -> Block<'static> {
    let mut spans = vec![Span::styled(format!(" {title} "), theme::title_style())];
    if let Some(status) = status {
        spans.push(Span::styled("· ", theme::muted()));
        spans.push(Span::styled(format!("{status} "), theme::status_style(status)));
    }
    Block::default()
        .title(Line::from(spans))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            theme::border_focused()
        } else {
            theme::border_default()
        })
}

/// Render `lines` inside a panel block.
pub fn render_lines(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    status: Option<&str>,
    lines: Vec<Line<'static>>,
) {
    let paragraph = Paragraph::new(lines)
        .block(block(title, status, false))
        .style(theme::body())
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Plain strings as body-styled lines.
pub fn plain(lines: Vec<String>) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .map(|l| Line::styled(l, theme::body()))
        .collect()
}
