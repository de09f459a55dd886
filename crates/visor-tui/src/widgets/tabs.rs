//! Inline tab bar for the authenticated views.

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::screen::ScreenId;
use crate::theme;

/// ` 1 Dashboard   2 Demos ` with the active view highlighted.
pub fn view_tabs(active: ScreenId) -> Line<'static> {
    let mut spans = Vec::with_capacity(ScreenId::TABS.len() * 2);
    for (i, id) in ScreenId::TABS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }
        let label = format!(" {} {} ", id.number(), id.label());
        if *id == active {
            spans.push(Span::styled(
                label,
                theme::tab_active().add_modifier(Modifier::UNDERLINED),
            ));
        } else {
            spans.push(Span::styled(label, theme::tab_inactive()));
        }
    }
    Line::from(spans)
}
