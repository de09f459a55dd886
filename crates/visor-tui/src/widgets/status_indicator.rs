//! Health indicator dots and status words with color mapping.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use visor_api::models::Health;
use visor_core::panels::view;

use crate::theme;

/// `● Camera Ready` when up, `○ Camera Down` otherwise.
pub fn health_spans(health: Option<&Health>) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (label, state, up) in view::health_indicators(health) {
        let (symbol, word, color) = if up {
            ("●", state, theme::SUCCESS_GREEN)
        } else {
            ("○", "Down", theme::ERROR_RED)
        };
        spans.push(Span::styled(
            format!("{symbol} {label} "),
            Style::default().fg(color),
        ));
        spans.push(Span::styled(format!("{word}  "), theme::muted()));
    }
    spans
}

/// `Status: <word>` with the word colored by [`theme::status_color`].
pub fn status_line(label: &str, status: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), theme::muted()),
        Span::styled(status.to_owned(), theme::status_style(status)),
    ])
}
