// ── Core error types ──
//
// Failures the orchestration layer reports to the presentation layer.
// Transport problems arrive already normalized as `ApiError`; this module
// adds the local failures (validation, no match) and the taxonomy class
// every failure falls into.

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;
use visor_api::ApiError;
use visor_api::models::FaceMatch;

/// A required local input is missing. Checked before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ValidationCode {
    NameRequired,
    ImageRequired,
    RecognitionDisabled,
}

/// Error taxonomy shown to operators and used for exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    TransportFailure,
    ValidationFailure,
    NoMatch,
    DegradedPoll,
    Config,
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(ValidationCode),

    #[error("{0}")]
    Transport(ApiError),

    /// A scheduled poll failed; the loop keeps running.
    #[error("{0}")]
    Degraded(ApiError),

    /// Recognition worked but nobody scored at or above the threshold.
    #[error("no_match")]
    NoMatch { best: Option<FaceMatch> },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::ValidationFailure,
            Self::Transport(_) => ErrorClass::TransportFailure,
            Self::Degraded(_) => ErrorClass::DegradedPoll,
            Self::NoMatch { .. } => ErrorClass::NoMatch,
            Self::Config { .. } => ErrorClass::Config,
        }
    }

    /// Stable code: the validation code, the endpoint failure code, or the class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(code) => (*code).into(),
            Self::Transport(e) | Self::Degraded(e) => e.code(),
            Self::NoMatch { .. } => "no_match",
            Self::Config { .. } => "config",
        }
    }
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        Self::Transport(err)
    }
}

impl From<ValidationCode> for CoreError {
    fn from(code: ValidationCode) -> Self {
        Self::Validation(code)
    }
}
