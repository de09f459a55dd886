use std::fmt;

use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};
use thiserror::Error;

// ── Endpoint families ───────────────────────────────────────────────

/// One logical backend operation, regardless of its live/upload variant.
///
/// Every family owns a stable, machine-readable failure code that the
/// dashboard shows when the backend does not supply a better message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EndpointFamily {
    Health,
    Detections,
    Capture,
    VideoStream,
    FaceLast,
    FaceRegister,
    FaceRecognize,
    Emotion,
    Timeline,
    ActionLast,
    AudioLast,
    SecurityLast,
    UnknownFrame,
    Attendance,
}

impl EndpointFamily {
    /// The family default failure code (e.g. `"health_failed"`).
    pub fn failure_code(self) -> &'static str {
        match self {
            Self::Health => "health_failed",
            Self::Detections => "detections_failed",
            Self::Capture => "capture_failed",
            Self::VideoStream => "stream_failed",
            Self::FaceLast => "face_last_failed",
            Self::FaceRegister => "face_register_failed",
            Self::FaceRecognize => "face_recognize_failed",
            Self::Emotion => "emotion_failed",
            Self::Timeline => "timeline_failed",
            Self::ActionLast => "action_failed",
            Self::AudioLast => "audio_failed",
            Self::SecurityLast => "security_failed",
            Self::UnknownFrame => "unknown_frame_failed",
            Self::Attendance => "attendance_failed",
        }
    }
}

// ── Edge error ──────────────────────────────────────────────────────

/// Raw failure raised while talking to the backend.
///
/// This type never leaves the client: [`VisionClient`](crate::VisionClient)
/// folds it into an [`ApiError`] tagged with the endpoint family before
/// returning.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-2xx response. `body` is kept so the backend's own message can be
    /// extracted.
    #[error("HTTP {status}")]
    Status { status: u16, body: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status == 503 || *status == 429,
            _ => false,
        }
    }

    /// Fold this edge error into the typed error of an endpoint family.
    pub fn into_api_error(self, family: EndpointFamily) -> ApiError {
        match self {
            Self::Status { status, body } => ApiError {
                family,
                message: backend_message(&body),
                status: Some(status),
            },
            Self::Transport(e) => ApiError {
                family,
                message: None,
                status: e.status().map(|s| s.as_u16()),
            },
            Self::InvalidUrl(_) | Self::Deserialization { .. } | Self::Tls(_) => ApiError {
                family,
                message: None,
                status: None,
            },
        }
    }
}

/// Pull a human message out of a backend error body.
///
/// The backend uses `{"detail": "..."}` for raised HTTP errors and
/// `{"ok": false, "error": "..."}` for soft failures. Non-string values
/// (validation arrays, nested upstream payloads) are ignored.
pub(crate) fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .map(str::to_owned)
}

// ── Endpoint result error ───────────────────────────────────────────

/// The error half of an [`EndpointResult`].
///
/// Carries the endpoint family (and with it a stable failure code), the
/// backend's own message when one was present, and the HTTP status when
/// the failure was a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub family: EndpointFamily,
    pub message: Option<String>,
    pub status: Option<u16>,
}

impl ApiError {
    /// An error with no backend message (falls back to the family code).
    pub fn new(family: EndpointFamily) -> Self {
        Self {
            family,
            message: None,
            status: None,
        }
    }

    /// Machine-readable failure code of the endpoint family.
    pub fn code(&self) -> &'static str {
        self.family.failure_code()
    }

    /// Text shown to the operator: the backend message when present,
    /// otherwise the family default code.
    pub fn status_text(&self) -> &str {
        self.message.as_deref().unwrap_or(self.family.failure_code())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_text())
    }
}

impl std::error::Error for ApiError {}

/// Result of every Transport Client call.
pub type EndpointResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_family_has_a_distinct_failure_code() {
        let mut codes: Vec<&str> = EndpointFamily::iter()
            .map(EndpointFamily::failure_code)
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), EndpointFamily::iter().count());
        assert!(codes.iter().all(|c| c.ends_with("_failed")));
    }

    #[test]
    fn backend_detail_wins_over_family_default() {
        let err = Error::Status {
            status: 503,
            body: r#"{"detail":"camera_unavailable"}"#.into(),
        }
        .into_api_error(EndpointFamily::Capture);
        assert_eq!(err.status_text(), "camera_unavailable");
        assert_eq!(err.code(), "capture_failed");
        assert_eq!(err.status, Some(503));
    }

    #[test]
    fn soft_error_field_is_used() {
        assert_eq!(
            backend_message(r#"{"ok":false,"error":"cooldown"}"#).as_deref(),
            Some("cooldown")
        );
    }

    #[test]
    fn non_string_detail_falls_back_to_family_code() {
        let err = Error::Status {
            status: 422,
            body: r#"{"detail":[{"loc":["body","name"],"msg":"field required"}]}"#.into(),
        }
        .into_api_error(EndpointFamily::FaceRegister);
        assert_eq!(err.message, None);
        assert_eq!(err.to_string(), "face_register_failed");
    }

    #[test]
    fn unparseable_body_has_no_message() {
        assert_eq!(backend_message("<html>502</html>"), None);
    }
}
