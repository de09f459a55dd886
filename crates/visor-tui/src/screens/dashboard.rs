//! Dashboard view: live feed, detections, capture, emotion, face,
//! action, audio and timeline panels.

use std::path::PathBuf;

use bytesize::ByteSize;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use visor_api::models::{ActionLast, AudioLast, Detections, FaceLast, Timeline};
use visor_core::panels::{
    CaptureState, EMOTION_TOP_N, EmotionState, RecognizeState, RegisterStatus, view,
};
use visor_core::{FeedState, PanelState, Phase};

use crate::action::{Action, ImageInput};
use crate::component::Component;
use crate::theme;
use crate::widgets::panel;
use crate::widgets::prompt::{Prompt, PromptEvent};
use crate::widgets::status_indicator::status_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    RegisterName,
    ImagePath,
}

#[derive(Default)]
pub struct DashboardScreen {
    focused: bool,
    feed: FeedState,
    detections: PanelState<Detections>,
    action: PanelState<ActionLast>,
    audio: PanelState<AudioLast>,
    timeline: PanelState<Timeline>,
    face_last: PanelState<FaceLast>,
    capture: CaptureState,
    register: RegisterStatus,
    recognize: RecognizeState,
    emotion: EmotionState,
    face_enabled: bool,
    upload_mode: bool,
    upload_path: Option<PathBuf>,
    prompt: Option<(PromptKind, Prompt)>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image the next face or emotion action sends.
    fn image(&self) -> ImageInput {
        if self.upload_mode {
            ImageInput::Upload(self.upload_path.clone())
        } else {
            ImageInput::Live
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Option<Action> {
        let (kind, prompt) = self.prompt.as_mut()?;
        let kind = *kind;
        match prompt.handle_key(key) {
            PromptEvent::Edited => None,
            PromptEvent::Cancel => {
                self.prompt = None;
                None
            }
            PromptEvent::Submit(value) => {
                self.prompt = None;
                match kind {
                    PromptKind::RegisterName => Some(Action::RegisterFace {
                        name: value,
                        image: self.image(),
                    }),
                    PromptKind::ImagePath => {
                        let value = value.trim();
                        self.upload_path = (!value.is_empty()).then(|| PathBuf::from(value));
                        self.upload_mode = true;
                        None
                    }
                }
            }
        }
    }

    // ── Panel bodies ────────────────────────────────────────────────

    fn feed_lines(&self) -> Vec<Line<'static>> {
        let Some(session) = self.feed.session else {
            return vec![Line::styled("Stream offline.", theme::muted())];
        };
        vec![
            Line::styled(
                format!("Stream: {}", self.feed.url.as_deref().unwrap_or("-")),
                theme::body(),
            ),
            Line::styled(
                format!(
                    "Nonce {} · frames {} · last frame {}",
                    session.nonce,
                    self.feed.frames,
                    ByteSize::b(u64::try_from(self.feed.last_frame_bytes).unwrap_or(u64::MAX))
                ),
                theme::muted(),
            ),
        ]
    }

    fn detection_lines(&self) -> Vec<Line<'static>> {
        let payload = self.detections.payload.as_ref();
        let mut lines = vec![Line::styled(view::last_update(payload), theme::muted())];
        lines.extend(panel::plain(view::detection_lines(payload)));
        lines
    }

    fn capture_lines(&self) -> Vec<Line<'static>> {
        let upload = match &self.capture.last_upload_url {
            Some(url) => Line::styled(format!("Last upload: {url}"), theme::body()),
            None => Line::styled("No upload yet.", theme::muted()),
        };
        vec![upload, hint_line("c", "capture image now")]
    }

    fn emotion_lines(&self) -> Vec<Line<'static>> {
        let mut lines = if self.emotion.results.is_empty() {
            vec![Line::styled("No analysis yet.", theme::muted())]
        } else {
            panel::plain(view::score_lines(&self.emotion.results, EMOTION_TOP_N))
        };
        lines.push(hint_line("e", "analyze emotion"));
        lines
    }

    fn face_lines(&self) -> Vec<Line<'static>> {
        let enabled = if self.face_enabled { "on" } else { "off" };
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Recognition: ", theme::muted()),
                Span::styled(
                    enabled,
                    theme::status_style(if self.face_enabled { "ready" } else { "idle" }),
                ),
            ]),
            Line::styled(
                view::auto_recognition_line(self.face_last.payload.as_ref()),
                theme::body(),
            ),
            status_line("Register", self.register.text()),
        ];

        let mut recognize = status_line("Recognize", self.recognize.status.text());
        if let Some(best) = &self.recognize.best {
            recognize.push_span(Span::styled(
                format!("  {} ({:.3})", best.name, best.score),
                theme::emphasis(),
            ));
        }
        lines.push(recognize);
        lines.push(Line::styled(
            format!("Image: {}", self.image().label()),
            theme::muted(),
        ));
        lines.push(hint_line("f", "toggle  r register  g recognize"));
        lines
    }

    fn action_lines(&self) -> Vec<Line<'static>> {
        let result = self.action.payload.as_ref().and_then(|a| a.result.as_ref());
        let lines = view::action_lines(result);
        if lines.is_empty() {
            return vec![Line::styled("No action detected yet.", theme::muted())];
        }
        let mut out = panel::plain(lines);
        if let Some(first) = out.first_mut() {
            *first = first.clone().style(theme::emphasis());
        }
        out
    }

    fn audio_lines(&self) -> Vec<Line<'static>> {
        let result = self.audio.payload.as_ref().and_then(|a| a.result.as_ref());
        let alert = result.and_then(|r| r.alert.as_ref()).is_some();
        let mut out = panel::plain(view::audio_lines(result));
        if alert {
            if let Some(first) = out.first_mut() {
                *first = first.clone().style(theme::emphasis());
            }
        }
        out
    }
}

fn hint_line(key: &'static str, text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, theme::key_hint_key()),
        Span::styled(format!(" {text}"), theme::key_hint()),
    ])
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.prompt.is_some() {
            return Ok(self.handle_prompt_key(key));
        }
        let action = match key.code {
            KeyCode::Char('c') => Some(Action::Capture),
            KeyCode::Char('e') => Some(Action::AnalyzeEmotion(self.image())),
            KeyCode::Char('f') => Some(Action::ToggleFaceRecognition),
            KeyCode::Char('g') => Some(Action::RecognizeFace(self.image())),
            KeyCode::Char('r') => {
                self.prompt = Some((PromptKind::RegisterName, Prompt::new("Register face · name", "")));
                None
            }
            KeyCode::Char('m') => {
                self.upload_mode = !self.upload_mode;
                None
            }
            KeyCode::Char('p') => {
                let current = self
                    .upload_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                self.prompt = Some((PromptKind::ImagePath, Prompt::new("Upload image path", current)));
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::FeedUpdated(f) => self.feed = f.clone(),
            Action::DetectionsUpdated(s) => self.detections = s.clone(),
            Action::ActionUpdated(s) => self.action = s.clone(),
            Action::AudioUpdated(s) => self.audio = s.clone(),
            Action::TimelineUpdated(s) => self.timeline = s.clone(),
            Action::FaceLastUpdated(s) => self.face_last = s.clone(),
            Action::CaptureUpdated(s) => self.capture = s.clone(),
            Action::RegisterUpdated(s) => self.register = s.clone(),
            Action::RecognizeUpdated(s) => self.recognize = s.clone(),
            Action::EmotionUpdated(s) => self.emotion = s.clone(),
            Action::FaceRecognitionToggled(enabled) => self.face_enabled = *enabled,
            Action::PhaseChanged(Phase::Login) => {
                self.face_enabled = false;
                self.prompt = None;
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [top, middle, bottom] = Layout::vertical([
            Constraint::Percentage(30),
            Constraint::Percentage(35),
            Constraint::Min(6),
        ])
        .areas(area);
        let [feed_area, detections_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(top);
        let [capture_area, emotion_area, face_area] = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .areas(middle);
        let [action_area, audio_area, timeline_area] = Layout::horizontal([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(50),
        ])
        .areas(bottom);

        let feed_status = self
            .feed
            .session
            .map_or_else(|| "offline".to_owned(), |s| s.status.to_string());
        panel::render_lines(frame, feed_area, "Live Feed", Some(&feed_status), self.feed_lines());
        panel::render_lines(
            frame,
            detections_area,
            "Detections",
            Some(self.detections.status.text()),
            self.detection_lines(),
        );
        panel::render_lines(
            frame,
            capture_area,
            "Capture",
            Some(self.capture.status.text()),
            self.capture_lines(),
        );
        panel::render_lines(
            frame,
            emotion_area,
            "Emotion",
            Some(self.emotion.status.text()),
            self.emotion_lines(),
        );
        panel::render_lines(
            frame,
            face_area,
            "Facial Recognition",
            Some(self.face_last.status.text()),
            self.face_lines(),
        );
        panel::render_lines(
            frame,
            action_area,
            "Action",
            Some(self.action.status.text()),
            self.action_lines(),
        );
        panel::render_lines(
            frame,
            audio_area,
            "Audio",
            Some(self.audio.status.text()),
            self.audio_lines(),
        );

        let timeline = view::timeline_lines(self.timeline.payload.as_ref());
        let timeline_block = panel::block("Timeline", Some(self.timeline.status.text()), self.focused);
        frame.render_widget(
            Paragraph::new(panel::plain(timeline))
                .block(timeline_block)
                .style(theme::body()),
            timeline_area,
        );

        if let Some((_, prompt)) = &self.prompt {
            prompt.render(frame, area);
        }
    }

    fn captures_input(&self) -> bool {
        self.prompt.is_some()
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn hints(&self) -> &'static str {
        "m live/upload  p image path"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use visor_core::ValidationCode;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(screen: &mut DashboardScreen, s: &str) {
        for c in s.chars() {
            screen.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn register_prompt_sends_name_with_current_image() {
        let mut screen = DashboardScreen::new();
        assert_eq!(screen.handle_key_event(key(KeyCode::Char('r'))).unwrap(), None);
        assert!(screen.captures_input());

        // Keys go to the prompt, not to panel bindings
        type_str(&mut screen, "carl");
        let action = screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(
            action,
            Some(Action::RegisterFace {
                name: "carl".into(),
                image: ImageInput::Live,
            })
        );
        assert!(!screen.captures_input());
    }

    #[test]
    fn upload_mode_without_path_sends_empty_upload() {
        let mut screen = DashboardScreen::new();
        screen.handle_key_event(key(KeyCode::Char('m'))).unwrap();
        let action = screen.handle_key_event(key(KeyCode::Char('e'))).unwrap();
        assert_eq!(action, Some(Action::AnalyzeEmotion(ImageInput::Upload(None))));
    }

    #[test]
    fn path_prompt_switches_to_upload() {
        let mut screen = DashboardScreen::new();
        screen.handle_key_event(key(KeyCode::Char('p'))).unwrap();
        type_str(&mut screen, "/tmp/me.jpg");
        screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        let action = screen.handle_key_event(key(KeyCode::Char('g'))).unwrap();
        assert_eq!(
            action,
            Some(Action::RecognizeFace(ImageInput::Upload(Some(
                "/tmp/me.jpg".into()
            ))))
        );
    }

    #[test]
    fn logout_resets_face_toggle_and_prompt() {
        let mut screen = DashboardScreen::new();
        screen.update(&Action::FaceRecognitionToggled(true)).unwrap();
        screen.handle_key_event(key(KeyCode::Char('r'))).unwrap();
        screen.update(&Action::PhaseChanged(Phase::Login)).unwrap();
        assert!(!screen.face_enabled);
        assert!(!screen.captures_input());
    }

    #[test]
    fn register_status_shows_validation_code() {
        let mut screen = DashboardScreen::new();
        screen
            .update(&Action::RegisterUpdated(RegisterStatus::Invalid(
                ValidationCode::NameRequired,
            )))
            .unwrap();
        let text: Vec<String> = screen.face_lines().iter().map(ToString::to_string).collect();
        assert!(text.contains(&"Register: name_required".to_owned()));
    }
}
