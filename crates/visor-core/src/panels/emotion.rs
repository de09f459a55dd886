use std::sync::Arc;

use tokio::sync::watch;
use visor_api::models::LabelScore;
use visor_api::{ApiError, VisionClient};

use super::ImageChoice;
use crate::error::ValidationCode;

/// Number of labels shown.
pub const EMOTION_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EmotionStatus {
    #[default]
    Idle,
    Analyzing,
    Done,
    Invalid(ValidationCode),
    Error(ApiError),
}

impl EmotionStatus {
    pub fn text(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Done => "done",
            Self::Invalid(code) => code.as_ref(),
            Self::Error(err) => err.status_text(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmotionState {
    pub status: EmotionStatus,
    /// Top labels of the last analysis, backend order.
    pub results: Vec<LabelScore>,
}

/// Facial-expression analysis of the live camera or an uploaded image.
#[derive(Clone)]
pub struct EmotionPanel {
    client: VisionClient,
    state: Arc<watch::Sender<EmotionState>>,
}

impl EmotionPanel {
    pub fn new(client: VisionClient) -> Self {
        let (state, _) = watch::channel(EmotionState::default());
        Self {
            client,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> EmotionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EmotionState> {
        self.state.subscribe()
    }

    pub async fn analyze(&self, image: ImageChoice) -> EmotionStatus {
        let source = match image.resolve() {
            Ok(source) => source,
            Err(code) => {
                let status = EmotionStatus::Invalid(code);
                self.state.send_modify(|s| s.status = status.clone());
                return status;
            }
        };

        self.state.send_replace(EmotionState {
            status: EmotionStatus::Analyzing,
            results: Vec::new(),
        });

        let (status, results) = match self.client.emotion(&source).await {
            Ok(resp) => {
                let mut results = resp.result;
                results.truncate(EMOTION_TOP_N);
                (EmotionStatus::Done, results)
            }
            Err(err) => (EmotionStatus::Error(err), Vec::new()),
        };
        self.state.send_replace(EmotionState {
            status: status.clone(),
            results,
        });
        status
    }
}
