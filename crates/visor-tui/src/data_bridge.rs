//! Data bridge: forwards dashboard state into TUI actions.
//!
//! Runs as a background task: subscribes to every watch channel the
//! [`Dashboard`] exposes and turns each change into an [`Action`] on the
//! TUI's action channel. Also fetches the security preview frame whenever
//! the security panel lists an unknown face.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use visor_api::VisionClient;
use visor_api::models::SecurityLast;
use visor_core::panels::view;
use visor_core::{Dashboard, PanelState};

use crate::action::{Action, SecurityPreview};

/// Forward every dashboard change until `cancel` fires.
pub async fn spawn_data_bridge(
    dashboard: Arc<Dashboard>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let panels = dashboard.panels();

    let mut phase = dashboard.subscribe_phase();
    let mut view = dashboard.subscribe_view();
    let mut auth = dashboard.gate().subscribe();
    let mut health = dashboard.health().subscribe();
    let mut feed = dashboard.subscribe_feed();
    let mut detections = panels.detections.subscribe();
    let mut action = panels.action.subscribe();
    let mut audio = panels.audio.subscribe();
    let mut timeline = panels.timeline.subscribe();
    let mut security = panels.security.subscribe();
    let mut attendance = panels.attendance.subscribe();
    let mut face_last = panels.face.last().subscribe();
    let mut capture = panels.capture.subscribe();
    let mut register = panels.face.subscribe_register();
    let mut recognize = panels.face.subscribe_recognize();
    let mut emotion = panels.emotion.subscribe();
    let mut preview = PreviewSlot::default();

    // Initial snapshots so screens draw real state immediately
    let _ = action_tx.send(Action::PhaseChanged(phase.borrow_and_update().clone()));
    let _ = action_tx.send(Action::ViewChanged(*view.borrow_and_update()));
    let _ = action_tx.send(Action::AuthUpdated(auth.borrow_and_update().clone()));
    let _ = action_tx.send(Action::HealthUpdated(health.borrow_and_update().clone()));
    let _ = action_tx.send(Action::FeedUpdated(feed.borrow_and_update().clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = phase.changed() => {
                let p = phase.borrow_and_update().clone();
                debug!(?p, "dispatching PhaseChanged");
                let _ = action_tx.send(Action::PhaseChanged(p));
            }
            Ok(()) = view.changed() => {
                let _ = action_tx.send(Action::ViewChanged(*view.borrow_and_update()));
            }
            Ok(()) = auth.changed() => {
                let _ = action_tx.send(Action::AuthUpdated(auth.borrow_and_update().clone()));
            }
            Ok(()) = health.changed() => {
                let _ = action_tx.send(Action::HealthUpdated(health.borrow_and_update().clone()));
            }
            Ok(()) = feed.changed() => {
                let _ = action_tx.send(Action::FeedUpdated(feed.borrow_and_update().clone()));
            }
            Ok(()) = detections.changed() => {
                let _ = action_tx.send(Action::DetectionsUpdated(detections.borrow_and_update().clone()));
            }
            Ok(()) = action.changed() => {
                let _ = action_tx.send(Action::ActionUpdated(action.borrow_and_update().clone()));
            }
            Ok(()) = audio.changed() => {
                let _ = action_tx.send(Action::AudioUpdated(audio.borrow_and_update().clone()));
            }
            Ok(()) = timeline.changed() => {
                let _ = action_tx.send(Action::TimelineUpdated(timeline.borrow_and_update().clone()));
            }
            Ok(()) = security.changed() => {
                let state = security.borrow_and_update().clone();
                preview.refresh(dashboard.client(), &state, &action_tx);
                let _ = action_tx.send(Action::SecurityUpdated(state));
            }
            Ok(()) = attendance.changed() => {
                let _ = action_tx.send(Action::AttendanceUpdated(attendance.borrow_and_update().clone()));
            }
            Ok(()) = face_last.changed() => {
                let _ = action_tx.send(Action::FaceLastUpdated(face_last.borrow_and_update().clone()));
            }
            Ok(()) = capture.changed() => {
                let _ = action_tx.send(Action::CaptureUpdated(capture.borrow_and_update().clone()));
            }
            Ok(()) = register.changed() => {
                let _ = action_tx.send(Action::RegisterUpdated(register.borrow_and_update().clone()));
            }
            Ok(()) = recognize.changed() => {
                let _ = action_tx.send(Action::RecognizeUpdated(recognize.borrow_and_update().clone()));
            }
            Ok(()) = emotion.changed() => {
                let _ = action_tx.send(Action::EmotionUpdated(emotion.borrow_and_update().clone()));
            }
        }
    }

    preview.abort();
    debug!("data bridge shut down");
}

/// Orders preview results: only the most recently issued fetch may
/// publish, and `invalidate` makes every earlier one inert.
#[derive(Debug, Clone, Default)]
struct PreviewGate {
    latest: Arc<Mutex<u64>>,
}

impl PreviewGate {
    fn issue(&self) -> u64 {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *latest += 1;
        *latest
    }

    /// Bump the generation and run `f` under the same lock, so no older
    /// fetch can publish after it.
    fn invalidate(&self, f: impl FnOnce()) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *latest += 1;
        f();
    }

    /// Run `f` only if `generation` is still the latest issued.
    fn publish(&self, generation: u64, f: impl FnOnce()) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if *latest != generation {
            return false;
        }
        f();
        true
    }
}

/// The in-flight preview fetch for the security panel.
#[derive(Default)]
struct PreviewSlot {
    gate: PreviewGate,
    task: Option<JoinHandle<()>>,
}

impl PreviewSlot {
    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Refresh the preview of the first listed unknown face, or clear it
    /// when there is none (including after the panel is unmounted). Each
    /// refresh uses a fresh nonce so the frame URL never repeats.
    fn refresh(
        &mut self,
        client: &VisionClient,
        state: &PanelState<SecurityLast>,
        action_tx: &mpsc::UnboundedSender<Action>,
    ) {
        self.abort();
        let result = state.payload.as_ref().and_then(|p| p.result.as_ref());
        let Some(unknown_id) = view::security_preview(result) else {
            self.gate.invalidate(|| {
                let _ = action_tx.send(Action::SecurityPreviewUpdated(None));
            });
            return;
        };

        let generation = self.gate.issue();
        let gate = self.gate.clone();
        let client = client.clone();
        let action_tx = action_tx.clone();
        self.task = Some(tokio::spawn(async move {
            let nonce = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
            let url = client
                .unknown_frame_url(unknown_id, nonce)
                .ok()
                .map(String::from);
            let frame = client
                .unknown_frame(unknown_id)
                .await
                .map(|bytes| bytes.len())
                .map_err(|err| err.status_text().to_owned());
            let published = gate.publish(generation, || {
                let _ = action_tx.send(Action::SecurityPreviewUpdated(Some(SecurityPreview {
                    unknown_id,
                    url,
                    frame,
                })));
            });
            if !published {
                debug!(unknown_id, generation, "stale security preview dropped");
            }
        }));
    }
}
