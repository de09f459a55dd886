// ── Dashboard supervisor ──
//
// Owns every controller and enforces the two mutually exclusive phases:
// while no session exists only the authentication gate runs; once a
// session exists the gate is disarmed and the panels of the current view
// plus the video stream run. The health monitor runs in both phases.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use visor_api::VisionClient;
use visor_api::models::{
    ActionLast, Attendance, AudioLast, Detections, Health, SecurityLast, Timeline,
};

use crate::auth::AuthGate;
use crate::config::{DashboardConfig, PollingConfig};
use crate::panels::{
    CapturePanel, EmotionPanel, FacePanel, FailurePolicy, PolledPanel, fetch_with,
};
use crate::session::{Identity, SessionStore};
use crate::stream::{StreamConfig, StreamFeed, StreamReconnector, StreamSession};

/// Screen shown after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum View {
    #[default]
    Dashboard,
    Demos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// No session: the authentication gate is armed.
    Login,
    Authenticated(Identity),
}

/// Live feed summary for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    pub session: Option<StreamSession>,
    /// Stream URL for the current nonce.
    pub url: Option<String>,
    pub frames: u64,
    pub last_frame_bytes: usize,
}

// ── Panels ──────────────────────────────────────────────────────────

/// Every panel controller of the authenticated phase.
pub struct Panels {
    pub detections: PolledPanel<Detections>,
    pub action: PolledPanel<ActionLast>,
    pub audio: PolledPanel<AudioLast>,
    pub timeline: PolledPanel<Timeline>,
    pub security: PolledPanel<SecurityLast>,
    pub attendance: PolledPanel<Attendance>,
    pub capture: CapturePanel,
    pub emotion: EmotionPanel,
    pub face: FacePanel,
    timeline_limit: u32,
    attendance_limit: u32,
}

impl Panels {
    pub fn new(client: &VisionClient, polling: &PollingConfig) -> Self {
        Self {
            detections: PolledPanel::new("detections", polling.detections, FailurePolicy::Retain),
            action: PolledPanel::new("action", polling.action, FailurePolicy::Retain),
            audio: PolledPanel::new("audio", polling.audio, FailurePolicy::Retain),
            timeline: PolledPanel::new("timeline", polling.timeline, FailurePolicy::Retain),
            security: PolledPanel::new("security", polling.security, FailurePolicy::Retain),
            attendance: PolledPanel::new("attendance", polling.attendance, FailurePolicy::Retain),
            capture: CapturePanel::new(client.clone()),
            emotion: EmotionPanel::new(client.clone()),
            face: FacePanel::new(client.clone(), polling),
            timeline_limit: polling.timeline_limit,
            attendance_limit: polling.attendance_limit,
        }
    }

    /// Mount the polled panels shown on `view`.
    pub fn mount_view(&self, view: View, client: &VisionClient) {
        match view {
            View::Dashboard => {
                self.detections
                    .mount(fetch_with(client, |c| async move { c.detections().await }));
                self.action
                    .mount(fetch_with(client, |c| async move { c.action_last().await }));
                self.audio
                    .mount(fetch_with(client, |c| async move { c.audio_last().await }));
                let limit = self.timeline_limit;
                self.timeline
                    .mount(fetch_with(client, move |c| async move { c.timeline(limit).await }));
            }
            View::Demos => {
                self.security
                    .mount(fetch_with(client, |c| async move { c.security_last().await }));
                let limit = self.attendance_limit;
                self.attendance
                    .mount(fetch_with(client, move |c| async move { c.attendance(limit).await }));
            }
        }
        debug!(%view, "view mounted");
    }

    /// Unmount everything, including the face panel's enable flag.
    pub fn unmount_all(&self) {
        self.detections.unmount();
        self.action.unmount();
        self.audio.unmount();
        self.timeline.unmount();
        self.security.unmount();
        self.attendance.unmount();
        self.face.set_enabled(false);
    }
}

// ── Dashboard ───────────────────────────────────────────────────────

struct StreamSlot {
    reconnector: StreamReconnector,
    forward: CancellationToken,
}

struct Inner {
    client: VisionClient,
    session: SessionStore,
    gate: AuthGate<VisionClient>,
    health: PolledPanel<Health>,
    panels: Panels,
    stream_config: StreamConfig,
    stream: Mutex<Option<StreamSlot>>,
    feed: Arc<watch::Sender<FeedState>>,
    phase: watch::Sender<Phase>,
    view: watch::Sender<View>,
    /// Serializes phase and view transitions.
    transition: Mutex<()>,
    cancel: CancellationToken,
}

/// The running dashboard. Dropping it shuts everything down.
pub struct Dashboard {
    inner: Arc<Inner>,
}

impl Dashboard {
    /// Start the health monitor and the phase supervisor. Must be called
    /// inside a tokio runtime.
    pub fn start(client: VisionClient, config: DashboardConfig) -> Self {
        let session = SessionStore::new();
        let gate = AuthGate::new(client.clone(), session.clone(), config.auth);
        let health = PolledPanel::new("health", config.polling.health, FailurePolicy::Clear);
        health.mount(fetch_with(&client, |c| async move { c.health().await }));

        let (feed, _) = watch::channel(FeedState::default());
        let (phase, _) = watch::channel(Phase::Login);
        let (view, _) = watch::channel(View::default());

        let inner = Arc::new(Inner {
            panels: Panels::new(&client, &config.polling),
            client,
            session,
            gate,
            health,
            stream_config: config.stream,
            stream: Mutex::new(None),
            feed: Arc::new(feed),
            phase,
            view,
            transition: Mutex::new(()),
            cancel: CancellationToken::new(),
        });
        tokio::spawn(supervise(Arc::clone(&inner)));
        info!(base_url = %inner.client.base_url(), "dashboard started");
        Self { inner }
    }

    pub fn client(&self) -> &VisionClient {
        &self.inner.client
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn gate(&self) -> &AuthGate<VisionClient> {
        &self.inner.gate
    }

    pub fn health(&self) -> &PolledPanel<Health> {
        &self.inner.health
    }

    pub fn panels(&self) -> &Panels {
        &self.inner.panels
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase.borrow().clone()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.inner.phase.subscribe()
    }

    pub fn view(&self) -> View {
        *self.inner.view.borrow()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<View> {
        self.inner.view.subscribe()
    }

    pub fn subscribe_feed(&self) -> watch::Receiver<FeedState> {
        self.inner.feed.subscribe()
    }

    /// Switch views. While authenticated the old view's panels are
    /// unmounted before the new ones mount.
    pub fn set_view(&self, view: View) {
        let _guard = self.inner.transition();
        if self.inner.view.send_replace(view) == view {
            return;
        }
        if matches!(*self.inner.phase.borrow(), Phase::Authenticated(_)) {
            self.inner.panels.unmount_all();
            self.inner.panels.mount_view(view, &self.inner.client);
        }
        info!(%view, "view switched");
    }

    /// Toggle the face panel. Enabling is refused outside the authenticated
    /// phase, or once logout has cleared the session. Returns the flag now
    /// in effect.
    pub fn set_face_enabled(&self, enabled: bool) -> bool {
        let _guard = self.inner.transition();
        let authenticated = matches!(*self.inner.phase.borrow(), Phase::Authenticated(_))
            && self.inner.session.is_authenticated()
            && !self.inner.cancel.is_cancelled();
        if enabled && !authenticated {
            debug!("face recognition stays off outside the dashboard");
            return self.inner.panels.face.is_enabled();
        }
        self.inner.panels.face.set_enabled(enabled);
        enabled
    }

    /// Clear the session; the supervisor re-arms the gate.
    pub fn logout(&self) -> Option<Identity> {
        self.inner.session.clear()
    }

    /// Stop every loop. Idempotent.
    pub fn shutdown(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        self.inner.cancel.cancel();
        let _guard = self.inner.transition();
        self.inner.gate.disarm();
        self.inner.panels.unmount_all();
        self.inner.stop_stream();
        self.inner.health.unmount();
        info!("dashboard stopped");
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn transition(&self) -> MutexGuard<'_, ()> {
        self.transition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, identity: Option<Identity>) {
        let _guard = self.transition();
        if self.cancel.is_cancelled() {
            return;
        }
        if let Some(identity) = identity {
            self.gate.disarm();
            self.panels.mount_view(*self.view.borrow(), &self.client);
            self.start_stream();
            info!(name = %identity.name, "entered dashboard");
            self.phase.send_replace(Phase::Authenticated(identity));
        } else {
            self.panels.unmount_all();
            self.stop_stream();
            self.gate.arm();
            self.phase.send_replace(Phase::Login);
            info!("entered login");
        }
    }

    fn stream_slot(&self) -> MutexGuard<'_, Option<StreamSlot>> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_stream(&self) {
        let mut slot = self.stream_slot();
        if slot.is_some() {
            return;
        }
        self.feed.send_replace(FeedState::default());

        let reconnector = StreamReconnector::start(self.stream_config);
        let feed = Arc::clone(&self.feed);
        StreamFeed::spawn(reconnector.clone(), self.client.clone(), move |frame: Bytes| {
            feed.send_modify(|f| {
                f.frames += 1;
                f.last_frame_bytes = frame.len();
            });
        });

        let forward = CancellationToken::new();
        tokio::spawn(forward_session(
            reconnector.subscribe(),
            self.client.clone(),
            Arc::clone(&self.feed),
            forward.clone(),
        ));
        *slot = Some(StreamSlot {
            reconnector,
            forward,
        });
    }

    fn stop_stream(&self) {
        let Some(slot) = self.stream_slot().take() else {
            return;
        };
        slot.forward.cancel();
        slot.reconnector.stop();
        self.feed.send_replace(FeedState::default());
    }
}

async fn supervise(inner: Arc<Inner>) {
    let mut session = inner.session.subscribe();

    loop {
        let identity = session.borrow_and_update().clone();
        inner.enter(identity);

        tokio::select! {
            biased;
            () = inner.cancel.cancelled() => break,
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    debug!("dashboard supervisor stopped");
}

/// Mirror the reconnector's session (and the URL it implies) into the feed state.
async fn forward_session(
    mut rx: watch::Receiver<StreamSession>,
    client: VisionClient,
    feed: Arc<watch::Sender<FeedState>>,
    cancel: CancellationToken,
) {
    loop {
        let session = *rx.borrow_and_update();
        if cancel.is_cancelled() {
            break;
        }
        let url = client.stream_url(session.nonce).ok().map(String::from);
        feed.send_modify(|f| {
            f.session = Some(session);
            f.url = url;
        });

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
