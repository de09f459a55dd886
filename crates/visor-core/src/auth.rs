// Face-ID authentication gate.
//
// While armed, the gate asks the backend to recognize whoever is in front
// of the live camera and compares the best match against a fixed
// threshold. The first `Success` creates the session and disarms the gate;
// logout (session cleared) re-arms it from a clean `Idle` state.
//
// Each arming gets a fresh epoch. Results carry the epoch they were started
// under and are dropped if the gate was disarmed or re-armed since, so a
// late response never leaks into a newer arming.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};
use visor_api::models::{FaceMatch, RecognizeResponse};
use visor_api::{ApiError, EndpointResult, ImageSource, VisionClient};

use crate::error::CoreError;
use crate::lifecycle::Ordering;
use crate::poller::{PollHandle, Poller};
use crate::session::{Identity, SessionStore};

/// Minimum best-match score accepted as a login (inclusive).
pub const DEFAULT_AUTH_THRESHOLD: f64 = 0.45;

#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    pub threshold: f64,
    pub period: Duration,
    /// Whether scheduled attempts start as soon as the gate is armed.
    pub auto_login: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_AUTH_THRESHOLD,
            period: Duration::from_secs(4),
            auto_login: true,
        }
    }
}

// ── Outcome & displayed state ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AuthStatus {
    #[default]
    Idle,
    Scanning,
    Success,
    NoMatch,
    Failed,
}

/// What the login screen shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthAttempt {
    pub status: AuthStatus,
    pub best_match: Option<FaceMatch>,
    /// Raw error text of a failed attempt.
    pub error: Option<String>,
}

impl AuthAttempt {
    /// `Status: <status>` with ` · <error>` appended when there is one.
    pub fn status_line(&self) -> String {
        match &self.error {
            Some(err) => format!("Status: {} · {err}", self.status),
            None => format!("Status: {}", self.status),
        }
    }
}

/// Result of one authentication attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Success(Identity),
    /// A call that worked but found nobody confident enough.
    NoMatch { best: Option<FaceMatch> },
    Failed(ApiError),
}

impl AuthOutcome {
    /// `Ok` only for `Success`; the other outcomes become their error class.
    pub fn into_result(self) -> Result<Identity, CoreError> {
        match self {
            Self::Success(identity) => Ok(identity),
            Self::NoMatch { best } => Err(CoreError::NoMatch { best }),
            Self::Failed(err) => Err(CoreError::Transport(err)),
        }
    }
}

/// Apply the threshold to a recognition result.
pub fn decide(result: EndpointResult<RecognizeResponse>, threshold: f64) -> AuthOutcome {
    match result {
        Err(err) => AuthOutcome::Failed(err),
        Ok(resp) => match resp.best {
            Some(best) if best.score >= threshold => AuthOutcome::Success(Identity {
                name: best.name,
                score: best.score,
            }),
            best => AuthOutcome::NoMatch { best },
        },
    }
}

/// Live-camera face recognition, as the gate needs it.
pub trait FaceRecognizer: Send + Sync + 'static {
    fn recognize_live(&self) -> impl Future<Output = EndpointResult<RecognizeResponse>> + Send;
}

impl FaceRecognizer for VisionClient {
    fn recognize_live(&self) -> impl Future<Output = EndpointResult<RecognizeResponse>> + Send {
        async move { self.recognize_face(&ImageSource::Live).await }
    }
}

// ── Gate ────────────────────────────────────────────────────────────

/// State touched by attempts and deliveries. Owns no poll handle, so a
/// delivery holding the last reference can drop it safely.
struct GateState {
    attempt: watch::Sender<AuthAttempt>,
    session: SessionStore,
    threshold: f64,
    armed: AtomicBool,
    epoch: AtomicU64,
}

impl GateState {
    fn is_current(&self, epoch: u64) -> bool {
        self.armed.load(AtomicOrdering::SeqCst) && self.epoch.load(AtomicOrdering::SeqCst) == epoch
    }

    async fn run_attempt<R: FaceRecognizer>(&self, epoch: u64, recognizer: &R) -> AuthOutcome {
        self.attempt.send_if_modified(|a| {
            if !self.is_current(epoch) || a.status == AuthStatus::Success {
                return false;
            }
            a.status = AuthStatus::Scanning;
            a.error = None;
            true
        });
        debug!(epoch, "face-id attempt");
        decide(recognizer.recognize_live().await, self.threshold)
    }

    /// Scheduled attempts are skipped once a session exists.
    async fn scheduled_attempt<R: FaceRecognizer>(&self, epoch: u64, recognizer: &R) -> Option<AuthOutcome> {
        if self.session.is_authenticated() || !self.is_current(epoch) {
            return None;
        }
        Some(self.run_attempt(epoch, recognizer).await)
    }

    /// Show `outcome`; returns whether it created the session.
    fn apply(&self, epoch: u64, outcome: &AuthOutcome) -> bool {
        let mut created = false;
        self.attempt.send_if_modified(|a| {
            if !self.is_current(epoch) || a.status == AuthStatus::Success {
                return false;
            }
            *a = match outcome {
                AuthOutcome::Success(identity) => {
                    created = self.session.establish(identity.clone());
                    AuthAttempt {
                        status: AuthStatus::Success,
                        best_match: Some(FaceMatch {
                            id: None,
                            name: identity.name.clone(),
                            score: identity.score,
                        }),
                        error: None,
                    }
                }
                AuthOutcome::NoMatch { best } => AuthAttempt {
                    status: AuthStatus::NoMatch,
                    best_match: best.clone(),
                    error: None,
                },
                AuthOutcome::Failed(err) => AuthAttempt {
                    status: AuthStatus::Failed,
                    best_match: None,
                    error: Some(err.status_text().to_owned()),
                },
            };
            true
        });
        created
    }
}

struct Control {
    auto: bool,
    poll: Option<PollHandle>,
}

struct GateInner<R> {
    state: Arc<GateState>,
    recognizer: Arc<R>,
    period: Duration,
    control: Mutex<Control>,
}

impl<R> GateInner<R> {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Automatic face-ID login. Clones share one gate.
pub struct AuthGate<R> {
    inner: Arc<GateInner<R>>,
}

impl<R> Clone for AuthGate<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: FaceRecognizer> AuthGate<R> {
    /// A disarmed gate in `Idle`.
    pub fn new(recognizer: R, session: SessionStore, config: AuthConfig) -> Self {
        let (attempt, _) = watch::channel(AuthAttempt::default());
        let state = Arc::new(GateState {
            attempt,
            session,
            threshold: config.threshold,
            armed: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        });
        Self {
            inner: Arc::new(GateInner {
                state,
                recognizer: Arc::new(recognizer),
                period: config.period,
                control: Mutex::new(Control {
                    auto: config.auto_login,
                    poll: None,
                }),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthAttempt> {
        self.inner.state.attempt.subscribe()
    }

    pub fn attempt_state(&self) -> AuthAttempt {
        self.inner.state.attempt.borrow().clone()
    }

    pub fn threshold(&self) -> f64 {
        self.inner.state.threshold
    }

    pub fn is_armed(&self) -> bool {
        self.inner.state.armed.load(AtomicOrdering::SeqCst)
    }

    pub fn auto_enabled(&self) -> bool {
        self.inner.control().auto
    }

    /// Start a fresh arming in `Idle`. Scheduling starts if auto-login is on.
    pub fn arm(&self) {
        let mut control = self.inner.control();
        let state = &self.inner.state;
        if state.armed.load(AtomicOrdering::SeqCst) {
            return;
        }
        let epoch = state.epoch.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        state.armed.store(true, AtomicOrdering::SeqCst);
        state.attempt.send_replace(AuthAttempt::default());
        if control.auto {
            control.poll = Some(self.start_polling(epoch));
        }
        info!(epoch, auto = control.auto, "authentication gate armed");
    }

    /// Stop scheduling. In-flight attempts become inert.
    pub fn disarm(&self) {
        let handle = {
            let mut control = self.inner.control();
            let state = &self.inner.state;
            if !state.armed.swap(false, AtomicOrdering::SeqCst) {
                return;
            }
            state.epoch.fetch_add(1, AtomicOrdering::SeqCst);
            control.poll.take()
        };
        if let Some(handle) = handle {
            handle.stop();
        }
        info!("authentication gate disarmed");
    }

    fn disarm_epoch(&self, epoch: u64) {
        if self.inner.state.epoch.load(AtomicOrdering::SeqCst) == epoch {
            self.disarm();
        }
    }

    /// Toggle scheduled attempts. Takes effect immediately when armed.
    pub fn set_auto(&self, enabled: bool) {
        let stale = {
            let mut control = self.inner.control();
            control.auto = enabled;
            let state = &self.inner.state;
            if !state.armed.load(AtomicOrdering::SeqCst) {
                None
            } else if enabled {
                if control.poll.is_none() {
                    let epoch = state.epoch.load(AtomicOrdering::SeqCst);
                    control.poll = Some(self.start_polling(epoch));
                }
                None
            } else {
                control.poll.take()
            }
        };
        if let Some(handle) = stale {
            handle.stop();
        }
        debug!(enabled, "auto-login toggled");
    }

    /// One attempt under the current arming, without touching the displayed
    /// state beyond `Scanning`.
    pub async fn attempt(&self) -> AuthOutcome {
        let epoch = self.inner.state.epoch.load(AtomicOrdering::SeqCst);
        self.inner
            .state
            .run_attempt(epoch, self.inner.recognizer.as_ref())
            .await
    }

    /// Manual "Scan Face ID". May overlap a scheduled attempt; whichever
    /// completes last is shown. `None` when disarmed or already logged in.
    pub async fn scan_now(&self) -> Option<AuthOutcome> {
        let state = &self.inner.state;
        let epoch = state.epoch.load(AtomicOrdering::SeqCst);
        if !state.is_current(epoch) || state.session.is_authenticated() {
            return None;
        }
        let outcome = state.run_attempt(epoch, self.inner.recognizer.as_ref()).await;
        if state.apply(epoch, &outcome) {
            self.disarm_epoch(epoch);
        }
        Some(outcome)
    }

    fn start_polling(&self, epoch: u64) -> PollHandle {
        let fetch_state = Arc::clone(&self.inner.state);
        let recognizer = Arc::clone(&self.inner.recognizer);
        let apply_state = Arc::clone(&self.inner.state);
        let gate: Weak<GateInner<R>> = Arc::downgrade(&self.inner);

        Poller::new(self.inner.period)
            .named("auth")
            .ordering(Ordering::ArrivalOrder)
            .start(
                move || {
                    let state = Arc::clone(&fetch_state);
                    let recognizer = Arc::clone(&recognizer);
                    async move { state.scheduled_attempt(epoch, recognizer.as_ref()).await }
                },
                move |outcome: Option<AuthOutcome>| {
                    let Some(outcome) = outcome else { return };
                    if apply_state.apply(epoch, &outcome) {
                        // Stopping our own poller here would re-enter its latch.
                        let gate = gate.clone();
                        tokio::spawn(async move {
                            if let Some(inner) = gate.upgrade() {
                                AuthGate { inner }.disarm_epoch(epoch);
                            }
                        });
                    }
                },
            )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use visor_api::EndpointFamily;

    use super::*;
    use crate::error::ErrorClass;

    fn response(best: Option<(&str, f64)>) -> RecognizeResponse {
        RecognizeResponse {
            best: best.map(|(name, score)| FaceMatch {
                id: Some(1),
                name: name.into(),
                score,
            }),
            matches: Vec::new(),
            threshold: None,
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let hit = decide(Ok(response(Some(("Shami", 0.45)))), DEFAULT_AUTH_THRESHOLD);
        assert_eq!(
            hit,
            AuthOutcome::Success(Identity {
                name: "Shami".into(),
                score: 0.45
            })
        );
        let miss = decide(Ok(response(Some(("Shami", 0.44999)))), DEFAULT_AUTH_THRESHOLD);
        assert!(matches!(miss, AuthOutcome::NoMatch { best: Some(_) }));
    }

    #[test]
    fn no_best_match_and_failures() {
        assert_eq!(
            decide(Ok(response(None)), DEFAULT_AUTH_THRESHOLD),
            AuthOutcome::NoMatch { best: None }
        );
        let err = ApiError::new(EndpointFamily::FaceRecognize);
        assert_eq!(
            decide(Err(err.clone()), DEFAULT_AUTH_THRESHOLD),
            AuthOutcome::Failed(err)
        );
    }

    #[test]
    fn outcomes_map_onto_error_classes() {
        let below = decide(Ok(response(Some(("Shami", 0.2)))), DEFAULT_AUTH_THRESHOLD);
        let err = below.into_result().unwrap_err();
        assert_eq!(err.class(), ErrorClass::NoMatch);
        assert!(matches!(err, CoreError::NoMatch { best: Some(ref b) } if b.name == "Shami"));

        let failed = AuthOutcome::Failed(ApiError::new(EndpointFamily::FaceRecognize));
        assert_eq!(failed.into_result().unwrap_err().class(), ErrorClass::TransportFailure);

        let hit = decide(Ok(response(Some(("Shami", 0.9)))), DEFAULT_AUTH_THRESHOLD);
        assert_eq!(hit.into_result().unwrap().name, "Shami");
    }

    #[test]
    fn status_line_includes_error() {
        let attempt = AuthAttempt {
            status: AuthStatus::Failed,
            best_match: None,
            error: Some("camera_unavailable".into()),
        };
        assert_eq!(attempt.status_line(), "Status: failed · camera_unavailable");
        assert_eq!(AuthAttempt::default().status_line(), "Status: idle");
    }

    /// Replays scripted scores (the last one repeats) after a fixed latency.
    struct Scripted {
        calls: Arc<AtomicUsize>,
        script: Vec<Option<(&'static str, f64)>>,
        latency: Duration,
    }

    impl Scripted {
        fn new(script: Vec<Option<(&'static str, f64)>>, latency_ms: u64) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let me = Self {
                calls: Arc::clone(&calls),
                script,
                latency: Duration::from_millis(latency_ms),
            };
            (me, calls)
        }
    }

    impl FaceRecognizer for Scripted {
        fn recognize_live(&self) -> impl Future<Output = EndpointResult<RecognizeResponse>> + Send {
            let n = self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            let step = self.script[n.min(self.script.len() - 1)];
            let latency = self.latency;
            async move {
                tokio::time::sleep(latency).await;
                Ok(response(step))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn armed_gate_attempts_immediately_then_every_period() {
        let (rec, calls) = Scripted::new(vec![None], 10);
        let gate = AuthGate::new(rec, SessionStore::new(), AuthConfig::default());
        gate.arm();

        tokio::time::sleep(Duration::from_millis(8100)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 3);
        assert_eq!(gate.attempt_state().status, AuthStatus::NoMatch);
        gate.disarm();
    }

    #[tokio::test(start_paused = true)]
    async fn success_creates_one_session_and_stops_scheduling() {
        let (rec, calls) = Scripted::new(vec![Some(("Shami", 0.2)), Some(("Shami", 0.8))], 10);
        let session = SessionStore::new();
        let gate = AuthGate::new(rec, session.clone(), AuthConfig::default());
        gate.arm();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(session.current().map(|i| i.name), Some("Shami".into()));
        assert_eq!(gate.attempt_state().status, AuthStatus::Success);
        assert!(!gate.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_successes_create_the_session_once() {
        let (rec, calls) = Scripted::new(vec![Some(("A", 0.9)), Some(("B", 0.9))], 5000);
        let session = SessionStore::new();
        let mut changes = session.subscribe();
        let gate = AuthGate::new(rec, session.clone(), AuthConfig::default());
        gate.arm();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(session.current().map(|i| i.name), Some("A".into()));
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();
        assert!(!changes.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_rearms_from_idle() {
        let (rec, calls) = Scripted::new(vec![Some(("Shami", 0.9)), None], 10);
        let session = SessionStore::new();
        let gate = AuthGate::new(rec, session.clone(), AuthConfig::default());
        gate.arm();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(session.is_authenticated());

        session.clear();
        gate.arm();
        assert_eq!(gate.attempt_state(), AuthAttempt::default());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(gate.attempt_state().status, AuthStatus::NoMatch);
        gate.disarm();
    }

    #[tokio::test(start_paused = true)]
    async fn manual_scan_without_auto() {
        let (rec, calls) = Scripted::new(vec![Some(("Shami", 0.3))], 10);
        let config = AuthConfig {
            auto_login: false,
            ..AuthConfig::default()
        };
        let gate = AuthGate::new(rec, SessionStore::new(), config);

        assert_eq!(gate.scan_now().await, None);
        gate.arm();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);

        let outcome = gate.scan_now().await;
        assert!(matches!(outcome, Some(AuthOutcome::NoMatch { .. })));
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(gate.attempt_state().status, AuthStatus::NoMatch);
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_auto_stops_scheduled_attempts() {
        let (rec, calls) = Scripted::new(vec![None], 10);
        let gate = AuthGate::new(rec, SessionStore::new(), AuthConfig::default());
        gate.arm();
        tokio::time::sleep(Duration::from_millis(100)).await;
        gate.set_auto(false);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
        gate.set_auto(true);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
        gate.disarm();
    }
}
