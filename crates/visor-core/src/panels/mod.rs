// ── Panel controllers ──
//
// A polled panel binds one endpoint family to a `Poller` and exposes
// `{status, payload}` through a watch channel. Write panels (capture, face,
// emotion) expose one-shot submits that validate locally first and then
// make exactly one backend call.

mod capture;
mod emotion;
mod face;
pub mod view;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};
use visor_api::{ApiError, EndpointResult, ImageFile, ImageSource, VisionClient};

pub use capture::{CapturePanel, CaptureState, CaptureStatus};
pub use emotion::{EMOTION_TOP_N, EmotionPanel, EmotionState, EmotionStatus};
pub use face::{FacePanel, RecognizeState, RecognizeStatus, RegisterStatus};

use crate::error::ValidationCode;
use crate::poller::{PollHandle, Poller};

/// Status shown on every polled panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last poll failed; polling goes on.
    Degraded(ApiError),
}

impl PanelStatus {
    /// `idle`, `loading`, `ready`, or the failure text.
    pub fn text(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Degraded(err) => err.status_text(),
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Degraded(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelState<T> {
    pub status: PanelStatus,
    pub payload: Option<T>,
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self {
            status: PanelStatus::Idle,
            payload: None,
        }
    }
}

/// What a failed poll does to the last good payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep showing it next to the failure.
    Retain,
    /// Drop it.
    Clear,
}

// ── Polled panel ────────────────────────────────────────────────────

/// One endpoint family polled at a fixed period while mounted.
pub struct PolledPanel<T> {
    name: &'static str,
    period: Duration,
    policy: FailurePolicy,
    state: Arc<watch::Sender<PanelState<T>>>,
    poll: Mutex<Option<PollHandle>>,
}

impl<T: Clone + Send + Sync + 'static> PolledPanel<T> {
    pub fn new(name: &'static str, period: Duration, policy: FailurePolicy) -> Self {
        let (state, _) = watch::channel(PanelState::default());
        Self {
            name,
            period,
            policy,
            state: Arc::new(state),
            poll: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> PanelState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelState<T>> {
        self.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PollHandle>> {
        self.poll.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start polling `fetch`. A mounted panel keeps its existing poll session
    /// and returns `false`.
    pub fn mount<F, Fut>(&self, fetch: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = EndpointResult<T>> + Send + 'static,
    {
        let mut slot = self.lock();
        if slot.is_some() {
            return false;
        }
        self.state.send_replace(PanelState {
            status: PanelStatus::Loading,
            payload: None,
        });

        // Every tick shows `loading` until its result lands. The fetch runs
        // under the poller's latch, so this stays silent after unmount.
        let loading = Arc::clone(&self.state);
        let fetch = move || {
            loading.send_modify(|state| state.status = PanelStatus::Loading);
            fetch()
        };

        let tx = Arc::clone(&self.state);
        let (name, policy) = (self.name, self.policy);
        let degraded = AtomicBool::new(false);
        *slot = Some(Poller::new(self.period).named(name).start(fetch, move |result| {
            apply(&tx, name, policy, &degraded, result);
        }));
        debug!(panel = name, "panel mounted");
        true
    }

    /// Stop polling and reset to `Idle`. Late results are discarded.
    pub fn unmount(&self) {
        let handle = self.lock().take();
        if let Some(handle) = handle {
            handle.stop();
            self.state.send_replace(PanelState::default());
            debug!(panel = self.name, "panel unmounted");
        }
    }
}

/// `degraded` remembers whether the previous result failed, so only the
/// first failure of a streak logs at `warn`.
fn apply<T>(
    tx: &watch::Sender<PanelState<T>>,
    name: &'static str,
    policy: FailurePolicy,
    degraded: &AtomicBool,
    result: EndpointResult<T>,
) {
    let was_degraded = degraded.swap(result.is_err(), Ordering::SeqCst);
    tx.send_modify(|state| match result {
        Ok(payload) => {
            state.status = PanelStatus::Ready;
            state.payload = Some(payload);
        }
        Err(err) => {
            if !was_degraded {
                warn!(panel = name, error = %err, "poll degraded");
            } else {
                debug!(panel = name, error = %err, "poll still degraded");
            }
            state.status = PanelStatus::Degraded(err);
            if policy == FailurePolicy::Clear {
                state.payload = None;
            }
        }
    });
}

/// Build a poll fetch function that calls `f` with a clone of `client`.
pub fn fetch_with<T, F, Fut>(client: &VisionClient, f: F) -> impl Fn() -> Fut + Send + Sync + 'static
where
    F: Fn(VisionClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = EndpointResult<T>> + Send + 'static,
{
    let client = client.clone();
    move || f(client.clone())
}

// ── Image input ─────────────────────────────────────────────────────

/// Operator's choice of image for a face or emotion action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChoice {
    Live,
    /// Upload mode; `None` when no file has been picked.
    Upload(Option<ImageFile>),
}

impl ImageChoice {
    pub fn resolve(self) -> Result<ImageSource, ValidationCode> {
        match self {
            Self::Live => Ok(ImageSource::Live),
            Self::Upload(Some(file)) => Ok(ImageSource::Upload(file)),
            Self::Upload(None) => Err(ValidationCode::ImageRequired),
        }
    }
}
