//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::path::PathBuf;

use visor_api::models::{
    ActionLast, Attendance, AudioLast, Detections, FaceLast, Health, SecurityLast, Timeline,
};
use visor_core::panels::{CaptureState, EmotionState, RecognizeState, RegisterStatus};
use visor_core::{AuthAttempt, FeedState, PanelState, Phase, View};

/// Image the operator picked for a face or emotion action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageInput {
    #[default]
    Live,
    /// Upload mode; `None` until a path has been entered.
    Upload(Option<PathBuf>),
}

impl ImageInput {
    pub fn label(&self) -> String {
        match self {
            Self::Live => "live camera".into(),
            Self::Upload(None) => "upload (no file)".into(),
            Self::Upload(Some(path)) => format!("upload {}", path.display()),
        }
    }
}

/// Frame preview of the first unknown face on the security panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityPreview {
    pub unknown_id: u64,
    /// Cache-busted frame URL.
    pub url: Option<String>,
    /// Frame size on success, failure text otherwise.
    pub frame: Result<usize, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,
    Resize(u16, u16),
    ToggleHelp,

    // ── Session & navigation ──
    PhaseChanged(Phase),
    ViewChanged(View),
    SwitchView(View),
    Logout,

    // ── Authentication gate ──
    ScanFace,
    SetAutoLogin(bool),
    AuthUpdated(AuthAttempt),

    // ── Panel state from the data bridge ──
    HealthUpdated(PanelState<Health>),
    FeedUpdated(FeedState),
    DetectionsUpdated(PanelState<Detections>),
    ActionUpdated(PanelState<ActionLast>),
    AudioUpdated(PanelState<AudioLast>),
    TimelineUpdated(PanelState<Timeline>),
    SecurityUpdated(PanelState<SecurityLast>),
    SecurityPreviewUpdated(Option<SecurityPreview>),
    AttendanceUpdated(PanelState<Attendance>),
    FaceLastUpdated(PanelState<FaceLast>),
    CaptureUpdated(CaptureState),
    RegisterUpdated(RegisterStatus),
    RecognizeUpdated(RecognizeState),
    EmotionUpdated(EmotionState),

    // ── Operator commands ──
    Capture,
    ToggleFaceRecognition,
    FaceRecognitionToggled(bool),
    RegisterFace { name: String, image: ImageInput },
    RecognizeFace(ImageInput),
    AnalyzeEmotion(ImageInput),

    // ── Notifications ──
    Notify(Notification),
    DismissNotification,
}
