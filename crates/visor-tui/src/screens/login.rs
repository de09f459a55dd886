//! Login screen: face-ID gate controls.
//!
//! Enter scans immediately; `a` toggles the scheduled attempts. The status
//! line mirrors the gate's latest attempt, raw error text included.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use throbber_widgets_tui::{Throbber, ThrobberState};
use visor_core::{AuthAttempt, AuthStatus};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::panel;

pub struct LoginScreen {
    attempt: AuthAttempt,
    auto: bool,
    period: Duration,
    threshold: f64,
    throbber_state: ThrobberState,
}

impl LoginScreen {
    pub fn new(auto: bool, period: Duration, threshold: f64) -> Self {
        Self {
            attempt: AuthAttempt::default(),
            auto,
            period,
            threshold,
            throbber_state: ThrobberState::default(),
        }
    }

    fn auto_line(&self) -> Line<'static> {
        let (word, style) = if self.auto {
            ("on", Style::default().fg(theme::SUCCESS_GREEN))
        } else {
            ("off", theme::muted())
        };
        Line::from(vec![
            Span::styled("Auto login: ", theme::muted()),
            Span::styled(word, style),
            Span::styled(
                format!(" · every {}", humantime::format_duration(self.period)),
                theme::muted(),
            ),
        ])
    }

    fn best_line(&self) -> Option<Line<'static>> {
        let best = self.attempt.best_match.as_ref()?;
        Some(Line::from(vec![
            Span::styled("Best match: ", theme::muted()),
            Span::styled(
                format!("{} ({:.3})", best.name, best.score),
                theme::emphasis(),
            ),
            Span::styled(format!("  threshold {:.2}", self.threshold), theme::muted()),
        ]))
    }
}

impl Component for LoginScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => Ok(Some(Action::ScanFace)),
            KeyCode::Char('a') => {
                self.auto = !self.auto;
                Ok(Some(Action::SetAutoLogin(self.auto)))
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::AuthUpdated(attempt) => self.attempt = attempt.clone(),
            Action::Tick if self.attempt.status == AuthStatus::Scanning => {
                self.throbber_state.calc_next();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [card] = Layout::horizontal([Constraint::Length(64)])
            .flex(Flex::Center)
            .areas(area);
        let [card] = Layout::vertical([Constraint::Length(12)])
            .flex(Flex::Center)
            .areas(card);

        let block = panel::block("Face ID Login", None, true);
        let inner = block.inner(card);
        frame.render_widget(block, card);

        let [intro, scan, status, best, auto, _, hint] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new("Look at the camera to sign in.")
                .alignment(Alignment::Center)
                .style(theme::body()),
            intro,
        );

        if self.attempt.status == AuthStatus::Scanning {
            let throbber = Throbber::default()
                .label(" Scanning…")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, scan, &mut self.throbber_state.clone());
        }

        let status_style = theme::status_style(self.attempt.status.as_ref());
        frame.render_widget(
            Paragraph::new(Line::styled(self.attempt.status_line(), status_style)),
            status,
        );
        if let Some(line) = self.best_line() {
            frame.render_widget(Paragraph::new(line), best);
        }
        frame.render_widget(Paragraph::new(self.auto_line()), auto);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Enter", theme::key_hint_key()),
                Span::styled(" Scan Face ID   ", theme::key_hint()),
                Span::styled("a", theme::key_hint_key()),
                Span::styled(" toggle auto login", theme::key_hint()),
            ]))
            .alignment(Alignment::Center),
            hint,
        );
    }

    fn hints(&self) -> &'static str {
        "Enter scan  a auto"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;

    #[test]
    fn a_flips_auto_login() {
        let mut screen = LoginScreen::new(true, Duration::from_secs(4), 0.45);
        let action = screen
            .handle_key_event(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE))
            .unwrap();
        assert_eq!(action, Some(Action::SetAutoLogin(false)));
        assert_eq!(
            screen.auto_line().to_string(),
            "Auto login: off · every 4s"
        );
    }

    #[test]
    fn enter_scans() {
        let mut screen = LoginScreen::new(false, Duration::from_secs(4), 0.45);
        let action = screen
            .handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        assert_eq!(action, Some(Action::ScanFace));
    }
}
