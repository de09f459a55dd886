//! Single-line text prompt drawn as a popup over the current screen.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};
use tui_input::{Input, InputRequest};

use crate::theme;
use crate::widgets::panel;

/// What a key did to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    Submit(String),
    Cancel,
    Edited,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    title: &'static str,
    input: Input,
}

impl Prompt {
    pub fn new(title: &'static str, initial: impl Into<String>) -> Self {
        Self {
            title,
            input: Input::new(initial.into()),
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptEvent {
        let request = match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => return PromptEvent::Cancel,
            (_, KeyCode::Enter) => return PromptEvent::Submit(self.value().to_owned()),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => InputRequest::DeleteLine,
            (KeyModifiers::CONTROL, KeyCode::Char('w')) => InputRequest::DeletePrevWord,
            (_, KeyCode::Char(c)) => InputRequest::InsertChar(c),
            (_, KeyCode::Backspace) => InputRequest::DeletePrevChar,
            (_, KeyCode::Delete) => InputRequest::DeleteNextChar,
            (_, KeyCode::Left) => InputRequest::GoToPrevChar,
            (_, KeyCode::Right) => InputRequest::GoToNextChar,
            (_, KeyCode::Home) => InputRequest::GoToStart,
            (_, KeyCode::End) => InputRequest::GoToEnd,
            _ => return PromptEvent::Edited,
        };
        self.input.handle(request);
        PromptEvent::Edited
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let [popup] = Layout::horizontal([Constraint::Length(56)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::vertical([Constraint::Length(4)])
            .flex(Flex::Center)
            .areas(popup);

        frame.render_widget(Clear, popup);
        let block = panel::block(self.title, None, true);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [field, hint] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(inner);

        let width = usize::from(field.width.max(1) - 1);
        let scroll = self.input.visual_scroll(width);
        let visible: String = self.value().chars().skip(scroll).collect();
        frame.render_widget(Paragraph::new(visible).style(theme::body()), field);

        let cursor = self.input.visual_cursor().saturating_sub(scroll);
        let x = field.x + u16::try_from(cursor).unwrap_or(field.width);
        frame.set_cursor_position(Position::new(x.min(field.right()), field.y));

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Enter", theme::key_hint_key()),
                Span::styled(" confirm  ", theme::key_hint()),
                Span::styled("Esc", theme::key_hint_key()),
                Span::styled(" cancel", theme::key_hint()),
            ])),
            hint,
        );
    }
}
