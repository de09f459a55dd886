use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use visor_api::{ApiError, VisionClient};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CaptureStatus {
    #[default]
    Idle,
    Capturing,
    Uploaded,
    /// The backend answered but reported `ok: false`.
    Failed,
    Error(ApiError),
}

impl CaptureStatus {
    pub fn text(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
            Self::Error(err) => err.status_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureState {
    pub status: CaptureStatus,
    pub last_upload_url: Option<String>,
}

/// "Capture Image Now".
#[derive(Clone)]
pub struct CapturePanel {
    client: VisionClient,
    state: Arc<watch::Sender<CaptureState>>,
}

impl CapturePanel {
    pub fn new(client: VisionClient) -> Self {
        let (state, _) = watch::channel(CaptureState::default());
        Self {
            client,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    /// One capture call. The upload URL is replaced by whatever the backend
    /// returned, including nothing.
    pub async fn submit(&self) -> CaptureStatus {
        self.state.send_modify(|s| s.status = CaptureStatus::Capturing);

        let status = match self.client.capture().await {
            Ok(resp) => {
                let status = if resp.ok {
                    CaptureStatus::Uploaded
                } else {
                    CaptureStatus::Failed
                };
                if let Some(url) = &resp.upload_url {
                    info!(url = %url, "capture uploaded");
                }
                self.state.send_modify(|s| s.last_upload_url = resp.upload_url);
                status
            }
            Err(err) => CaptureStatus::Error(err),
        };

        self.state.send_modify(|s| s.status = status.clone());
        status
    }
}
