// visor-core: real-time orchestration between visor-api and the front ends.
//
// Pollers, the video stream reconnector, the face-ID gate, the session and
// the panel controllers, tied together by the dashboard supervisor. No
// rendering and no file access happen here.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
mod lifecycle;
pub mod panels;
pub mod poller;
pub mod session;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{
    AuthAttempt, AuthConfig, AuthGate, AuthOutcome, AuthStatus, DEFAULT_AUTH_THRESHOLD,
    FaceRecognizer, decide,
};
pub use config::{DashboardConfig, PollingConfig};
pub use dashboard::{Dashboard, FeedState, Panels, Phase, View};
pub use error::{CoreError, ErrorClass, ValidationCode};
pub use lifecycle::Ordering;
pub use panels::{FailurePolicy, ImageChoice, PanelState, PanelStatus, PolledPanel};
pub use poller::{PollHandle, Poller};
pub use session::{Identity, SessionStore};
pub use stream::{
    FrameSource, StreamConfig, StreamFeed, StreamReconnector, StreamSession, StreamStatus,
};
