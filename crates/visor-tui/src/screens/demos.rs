//! Demos view: unknown-face security monitor and attendance.

use bytesize::ByteSize;
use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use visor_api::models::{Attendance, SecurityLast};
use visor_core::PanelState;
use visor_core::panels::view;

use crate::action::{Action, SecurityPreview};
use crate::component::Component;
use crate::theme;
use crate::widgets::panel;

#[derive(Default)]
pub struct DemosScreen {
    security: PanelState<SecurityLast>,
    preview: Option<SecurityPreview>,
    attendance: PanelState<Attendance>,
}

impl DemosScreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn security_lines(&self) -> Vec<Line<'static>> {
        let result = self.security.payload.as_ref().and_then(|s| s.result.as_ref());
        let mut lines: Vec<Line<'static>> = view::security_lines(result)
            .into_iter()
            .map(|l| {
                let style = if l.ends_with("ALERT") {
                    theme::emphasis()
                } else {
                    theme::body()
                };
                Line::styled(l, style)
            })
            .collect();

        // Only preview the face the panel currently lists first
        let shown = view::security_preview(result);
        if let Some(preview) = self.preview.as_ref().filter(|p| Some(p.unknown_id) == shown) {
            lines.push(Line::raw(""));
            lines.extend(preview_lines(preview));
        }
        lines
    }
}

fn preview_lines(preview: &SecurityPreview) -> Vec<Line<'static>> {
    let frame = match &preview.frame {
        Ok(len) => Span::styled(
            ByteSize::b(u64::try_from(*len).unwrap_or(u64::MAX)).to_string(),
            theme::body(),
        ),
        Err(err) => Span::styled(err.clone(), theme::status_style(err)),
    };
    vec![
        Line::from(vec![
            Span::styled(format!("Preview of unknown #{}: ", preview.unknown_id), theme::muted()),
            frame,
        ]),
        Line::styled(preview.url.clone().unwrap_or_default(), theme::muted()),
    ]
}

impl Component for DemosScreen {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SecurityUpdated(s) => self.security = s.clone(),
            Action::SecurityPreviewUpdated(p) => self.preview = p.clone(),
            Action::AttendanceUpdated(s) => self.attendance = s.clone(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [security_area, attendance_area] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(area);

        panel::render_lines(
            frame,
            security_area,
            "Security · Unknown Faces",
            Some(self.security.status.text()),
            self.security_lines(),
        );
        panel::render_lines(
            frame,
            attendance_area,
            "Attendance",
            Some(self.attendance.status.text()),
            panel::plain(view::attendance_lines(self.attendance.payload.as_ref())),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use visor_api::models::{SecurityResult, UnknownFace};

    use super::*;

    fn security(ids: &[u64]) -> PanelState<SecurityLast> {
        PanelState {
            status: visor_core::PanelStatus::Ready,
            payload: Some(SecurityLast {
                result: Some(SecurityResult {
                    unknowns: ids
                        .iter()
                        .map(|&id| UnknownFace {
                            id,
                            duration_s: 1.0,
                            alerted: false,
                        })
                        .collect(),
                    threshold_s: Some(5.0),
                }),
            }),
        }
    }

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn stale_preview_is_hidden() {
        let mut screen = DemosScreen::new();
        screen.update(&Action::SecurityUpdated(security(&[7]))).unwrap();
        screen
            .update(&Action::SecurityPreviewUpdated(Some(SecurityPreview {
                unknown_id: 3,
                url: None,
                frame: Ok(2048),
            })))
            .unwrap();
        assert!(!text(&screen.security_lines()).iter().any(|l| l.contains("Preview")));

        screen
            .update(&Action::SecurityPreviewUpdated(Some(SecurityPreview {
                unknown_id: 7,
                url: Some("http://cam/security/unknown-frame?unknown_id=7&t=1".into()),
                frame: Ok(2048),
            })))
            .unwrap();
        let lines = text(&screen.security_lines());
        assert!(lines.iter().any(|l| l.starts_with("Preview of unknown #7: ")));
    }
}
