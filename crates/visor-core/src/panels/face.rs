// Face registration / recognition panel.
//
// Everything here sits behind the operator's enable flag. While disabled,
// no poll runs and every action is refused locally.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::info;
use visor_api::models::{FaceLast, FaceMatch};
use visor_api::{ApiError, VisionClient};

use super::{FailurePolicy, ImageChoice, PanelState, PolledPanel, fetch_with};
use crate::config::PollingConfig;
use crate::error::ValidationCode;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RegisterStatus {
    #[default]
    Idle,
    Registering,
    Registered,
    Invalid(ValidationCode),
    Error(ApiError),
}

impl RegisterStatus {
    pub fn text(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Registering => "registering",
            Self::Registered => "registered",
            Self::Invalid(code) => code.as_ref(),
            Self::Error(err) => err.status_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RecognizeStatus {
    #[default]
    Idle,
    Recognizing,
    Matched,
    Unknown,
    Invalid(ValidationCode),
    Error(ApiError),
}

impl RecognizeStatus {
    pub fn text(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Recognizing => "recognizing",
            Self::Matched => "matched",
            Self::Unknown => "unknown",
            Self::Invalid(code) => code.as_ref(),
            Self::Error(err) => err.status_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognizeState {
    pub status: RecognizeStatus,
    pub best: Option<FaceMatch>,
}

pub struct FacePanel {
    client: VisionClient,
    /// Held across mount and unmount so the flag and the poll never disagree.
    enabled: Mutex<bool>,
    last: PolledPanel<FaceLast>,
    register: Arc<watch::Sender<RegisterStatus>>,
    recognize: Arc<watch::Sender<RecognizeState>>,
}

impl FacePanel {
    pub fn new(client: VisionClient, polling: &PollingConfig) -> Self {
        let (register, _) = watch::channel(RegisterStatus::default());
        let (recognize, _) = watch::channel(RecognizeState::default());
        Self {
            client,
            enabled: Mutex::new(false),
            last: PolledPanel::new("face_last", polling.face_last, FailurePolicy::Clear),
            register: Arc::new(register),
            recognize: Arc::new(recognize),
        }
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        self.enabled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        *self.flag()
    }

    /// Enabling starts the auto-recognition poll; disabling stops it and
    /// clears the shown result.
    pub fn set_enabled(&self, enabled: bool) {
        let mut flag = self.flag();
        if *flag == enabled {
            return;
        }
        *flag = enabled;
        if enabled {
            self.last
                .mount(fetch_with(&self.client, |c| async move { c.face_last().await }));
        } else {
            self.last.unmount();
        }
        info!(enabled, "facial recognition toggled");
    }

    /// Latest auto-recognition poll.
    pub fn last(&self) -> &PolledPanel<FaceLast> {
        &self.last
    }

    pub fn auto_state(&self) -> PanelState<FaceLast> {
        self.last.state()
    }

    pub fn register_status(&self) -> RegisterStatus {
        self.register.borrow().clone()
    }

    pub fn subscribe_register(&self) -> watch::Receiver<RegisterStatus> {
        self.register.subscribe()
    }

    pub fn recognize_state(&self) -> RecognizeState {
        self.recognize.borrow().clone()
    }

    pub fn subscribe_recognize(&self) -> watch::Receiver<RecognizeState> {
        self.recognize.subscribe()
    }

    /// Enroll `name`. Checks, in order: enabled, non-blank name, image.
    pub async fn register(&self, name: &str, image: ImageChoice) -> RegisterStatus {
        let name = name.trim();
        let checked = if !self.is_enabled() {
            Err(ValidationCode::RecognitionDisabled)
        } else if name.is_empty() {
            Err(ValidationCode::NameRequired)
        } else {
            image.resolve()
        };
        let source = match checked {
            Ok(source) => source,
            Err(code) => return self.set_register(RegisterStatus::Invalid(code)),
        };

        self.set_register(RegisterStatus::Registering);
        let status = match self.client.register_face(name, &source).await {
            Ok(_) => {
                info!(name, "face registered");
                RegisterStatus::Registered
            }
            Err(err) => RegisterStatus::Error(err),
        };
        self.set_register(status)
    }

    fn set_register(&self, status: RegisterStatus) -> RegisterStatus {
        self.register.send_replace(status.clone());
        status
    }

    /// Identify a face; `matched` when the backend returns any best match.
    pub async fn recognize(&self, image: ImageChoice) -> RecognizeStatus {
        let checked = if self.is_enabled() {
            image.resolve()
        } else {
            Err(ValidationCode::RecognitionDisabled)
        };
        let source = match checked {
            Ok(source) => source,
            Err(code) => {
                let status = RecognizeStatus::Invalid(code);
                self.recognize.send_modify(|s| s.status = status.clone());
                return status;
            }
        };

        self.recognize.send_replace(RecognizeState {
            status: RecognizeStatus::Recognizing,
            best: None,
        });
        let next = match self.client.recognize_face(&source).await {
            Ok(resp) => RecognizeState {
                status: if resp.best.is_some() {
                    RecognizeStatus::Matched
                } else {
                    RecognizeStatus::Unknown
                },
                best: resp.best,
            },
            Err(err) => RecognizeState {
                status: RecognizeStatus::Error(err),
                best: None,
            },
        };
        let status = next.status.clone();
        self.recognize.send_replace(next);
        status
    }
}
