//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use visor_api::models::Health;
use visor_api::{ImageFile, VisionClient};
use visor_core::panels::{RegisterStatus, view};
use visor_core::{Dashboard, DashboardConfig, ImageChoice, PanelState, Phase, View};

use crate::action::{Action, ImageInput, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::{panel, status_indicator, tabs};

/// How long a toast stays up.
const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Top-level application state and event loop.
pub struct App {
    dashboard: Arc<Dashboard>,
    /// Derived from `phase` and `view`.
    active_screen: ScreenId,
    phase: Phase,
    view: View,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    health: PanelState<Health>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Cancels the data bridge task.
    data_cancel: CancellationToken,
    notification: Option<(Notification, Instant)>,
}

impl App {
    /// Start the dashboard supervisor. Must be called inside a tokio runtime.
    pub fn new(client: VisionClient, config: DashboardConfig) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens = create_screens(&config).into_iter().collect();
        let dashboard = Arc::new(Dashboard::start(client, config));

        Self {
            dashboard,
            active_screen: ScreenId::Login,
            phase: Phase::Login,
            view: View::default(),
            screens,
            running: true,
            help_visible: false,
            health: PanelState::default(),
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
            notification: None,
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        debug!(size = ?tui.size().unwrap_or((80, 24)), "terminal entered");
        self.init_screens()?;

        tokio::spawn(crate::data_bridge::spawn_data_bridge(
            Arc::clone(&self.dashboard),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        self.data_cancel.cancel();
        self.dashboard.shutdown();
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    fn authenticated(&self) -> bool {
        matches!(self.phase, Phase::Authenticated(_))
    }

    /// Global keys first, then the active screen. A screen holding a text
    /// prompt gets every key.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        let capturing = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input());
        if !capturing {
            match (key.modifiers, key.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c'))
                | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
                (_, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
                (_, KeyCode::Esc) if self.notification.is_some() => {
                    return Ok(Some(Action::DismissNotification));
                }
                _ => {}
            }

            if self.authenticated() {
                match (key.modifiers, key.code) {
                    (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='2')) => {
                        let n = u8::try_from(c.to_digit(10).unwrap_or(0)).unwrap_or(0);
                        if let Some(view) = ScreenId::from_number(n).and_then(ScreenId::view) {
                            return Ok(Some(Action::SwitchView(view)));
                        }
                    }
                    (KeyModifiers::NONE, KeyCode::Tab) => {
                        if let Some(view) = self.active_screen.next().view() {
                            return Ok(Some(Action::SwitchView(view)));
                        }
                    }
                    (KeyModifiers::NONE, KeyCode::Char('x')) => return Ok(Some(Action::Logout)),
                    _ => {}
                }
            }
        } else if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Render => {}

            // The next frame is drawn at the new size
            Action::Resize(w, h) => debug!(w, h, "terminal resized"),

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, at)| at.elapsed() >= NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.broadcast(action)?;
            }

            Action::PhaseChanged(phase) => {
                if let (Phase::Login, Phase::Authenticated(identity)) = (&self.phase, phase) {
                    self.action_tx.send(Action::Notify(Notification::success(format!(
                        "Welcome, {}",
                        view::session_line(identity)
                    ))))?;
                }
                self.phase = phase.clone();
                self.sync_active_screen();
                self.broadcast(action)?;
            }

            Action::ViewChanged(view) => {
                self.view = *view;
                self.sync_active_screen();
            }

            Action::SwitchView(view) => self.dashboard.set_view(*view),

            Action::Logout => {
                if let Some(identity) = self.dashboard.logout() {
                    self.action_tx.send(Action::Notify(Notification::info(format!(
                        "Logged out {}",
                        identity.name
                    ))))?;
                }
            }

            Action::ScanFace => self.spawn(|dashboard, _| async move {
                if dashboard.gate().scan_now().await.is_none() {
                    debug!("scan ignored: gate not armed");
                }
            }),

            Action::SetAutoLogin(enabled) => self.dashboard.gate().set_auto(*enabled),

            Action::HealthUpdated(state) => self.health = state.clone(),

            Action::Capture => self.spawn(|dashboard, _| async move {
                dashboard.panels().capture.submit().await;
            }),

            Action::ToggleFaceRecognition => {
                let wanted = !self.dashboard.panels().face.is_enabled();
                let enabled = self.dashboard.set_face_enabled(wanted);
                self.broadcast(&Action::FaceRecognitionToggled(enabled))?;
            }

            Action::RegisterFace { name, image } => {
                let (name, image) = (name.clone(), image.clone());
                self.spawn(|dashboard, tx| async move {
                    let Some(choice) = resolve_image(image, &tx).await else {
                        return;
                    };
                    let status = dashboard.panels().face.register(&name, choice).await;
                    if status == RegisterStatus::Registered {
                        let _ = tx.send(Action::Notify(Notification::success(format!(
                            "Registered {}",
                            name.trim()
                        ))));
                    }
                });
            }

            Action::RecognizeFace(image) => {
                let image = image.clone();
                self.spawn(|dashboard, tx| async move {
                    if let Some(choice) = resolve_image(image, &tx).await {
                        dashboard.panels().face.recognize(choice).await;
                    }
                });
            }

            Action::AnalyzeEmotion(image) => {
                let image = image.clone();
                self.spawn(|dashboard, tx| async move {
                    if let Some(choice) = resolve_image(image, &tx).await {
                        dashboard.panels().emotion.analyze(choice).await;
                    }
                });
            }

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),

            Action::DismissNotification => self.notification = None,

            // Panel state goes to every screen; hidden views keep theirs current
            other => self.broadcast(other)?,
        }

        Ok(())
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn sync_active_screen(&mut self) {
        let target = ScreenId::for_state(&self.phase, self.view);
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    /// Run an operator command off the event loop.
    fn spawn<F, Fut>(&self, f: F)
    where
        F: FnOnce(Arc<Dashboard>, mpsc::UnboundedSender<Action>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(f(Arc::clone(&self.dashboard), self.action_tx.clone()));
    }

    // ── Rendering ────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let [header, tab_area, content, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(u16::from(self.authenticated())),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(frame, header);
        if self.authenticated() {
            frame.render_widget(Paragraph::new(tabs::view_tabs(self.active_screen)), tab_area);
        }
        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content);
        }
        self.render_footer(frame, footer);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    /// Title, health indicators and the session.
    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(" VISOR ", theme::title_style())];
        spans.push(Span::styled("│ ", theme::key_hint()));
        spans.extend(status_indicator::health_spans(self.health.payload.as_ref()));

        if let Phase::Authenticated(identity) = &self.phase {
            spans.push(Span::styled("│ ", theme::key_hint()));
            spans.push(Span::styled(
                format!("● {}", view::session_line(identity)),
                Style::default().fg(theme::SUCCESS_GREEN),
            ));
            spans.push(Span::styled("  x logout", theme::key_hint()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Key hints, or the current toast.
    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        if let Some((n, _)) = &self.notification {
            let color = match n.level {
                NotificationLevel::Success => theme::SUCCESS_GREEN,
                NotificationLevel::Error => theme::ERROR_RED,
                NotificationLevel::Info => theme::NEON_CYAN,
            };
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" {}", n.message), Style::default().fg(color))),
                area,
            );
            return;
        }

        let screen_hints = self
            .screens
            .get(&self.active_screen)
            .map(|s| s.hints())
            .unwrap_or_default();
        let nav = if self.authenticated() {
            "  1-2 view  Tab next"
        } else {
            ""
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {screen_hints}{nav}  ? help  q quit"),
                theme::key_hint(),
            )),
            area,
        );
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let [popup] = Layout::horizontal([Constraint::Length(52)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::vertical([Constraint::Length(19)])
            .flex(Flex::Center)
            .areas(popup);

        let key = |k: &'static str, text: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {k:<10}"), theme::key_hint_key()),
                Span::styled(text, theme::key_hint()),
            ])
        };
        let heading = |t: &'static str| Line::styled(format!("  {t}"), theme::title_style());

        let lines = vec![
            heading("Login"),
            key("Enter", "Scan Face ID"),
            key("a", "Toggle auto login"),
            heading("Dashboard"),
            key("c", "Capture image now"),
            key("e", "Analyze emotion"),
            key("f", "Toggle facial recognition"),
            key("r / g", "Register / recognize face"),
            key("m / p", "Live or upload / image path"),
            heading("Global"),
            key("1-2 Tab", "Switch view"),
            key("x", "Log out"),
            key("?", "This help"),
            key("q", "Quit"),
            Line::raw(""),
            Line::styled("                      Esc or ? to close", theme::key_hint()),
        ];

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(panel::block("Keyboard Shortcuts", None, true))
                .style(Style::default().bg(theme::BG_DARK)),
            popup,
        );
    }
}

/// Turn the operator's pick into an [`ImageChoice`], reading an upload
/// from disk. A read failure is reported as a toast and yields `None`.
async fn resolve_image(
    input: ImageInput,
    tx: &mpsc::UnboundedSender<Action>,
) -> Option<ImageChoice> {
    let path = match input {
        ImageInput::Live => return Some(ImageChoice::Live),
        ImageInput::Upload(None) => return Some(ImageChoice::Upload(None)),
        ImageInput::Upload(Some(path)) => path,
    };

    let shown = path.display().to_string();
    let read = tokio::task::spawn_blocking(move || ImageFile::from_path(&path)).await;
    match read {
        Ok(Ok(file)) => Some(ImageChoice::Upload(Some(file))),
        Ok(Err(err)) => {
            warn!(path = %shown, error = %err, "failed to read upload");
            let _ = tx.send(Action::Notify(Notification::error(format!("{shown}: {err}"))));
            None
        }
        Err(err) => {
            warn!(error = %err, "upload reader task failed");
            None
        }
    }
}
