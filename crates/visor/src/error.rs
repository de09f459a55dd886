//! CLI error types with miette diagnostics.
//!
//! Maps endpoint, core and config failures into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use visor_api::ApiError;
use visor_config::ConfigError;
use visor_core::{CoreError, ErrorClass};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NO_MATCH: i32 = 3;
    pub const BACKEND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Request to the backend failed ({code})")]
    #[diagnostic(
        code(visor::connection_failed),
        help(
            "Check that the backend is running and accessible.\n\
             URL: {url}\n\
             Override it with --url or VISOR_URL, or run with -vv for details."
        )
    )]
    ConnectionFailed { code: String, url: String },

    #[error("Could not build the HTTP client: {reason}")]
    #[diagnostic(
        code(visor::tls_error),
        help("Check backend.ca_cert, or use --insecure (-k) for self-signed backends.")
    )]
    Client { reason: String },

    // ── Backend ──────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(visor::backend_error), help("HTTP {status} from the {family} endpoint."))]
    Backend {
        family: String,
        message: String,
        status: u16,
    },

    // ── Face ID ──────────────────────────────────────────────────────

    #[error("No face matched")]
    #[diagnostic(code(visor::no_match), help("{detail}"))]
    NoMatch { detail: String },

    #[error("No session after {seconds}s of scanning")]
    #[diagnostic(
        code(visor::timeout),
        help("Face the camera, or lower auth.threshold / pass --threshold.")
    )]
    Timeout { seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(visor::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(visor::config),
        help("Inspect the effective settings with: visor config show")
    )]
    Config(#[from] ConfigError),

    #[error("Configuration file already exists")]
    #[diagnostic(code(visor::config_exists), help("Pass --force to overwrite {path}"))]
    ConfigExists { path: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Client { .. } => exit_code::CONNECTION,
            Self::Backend { .. } => exit_code::BACKEND,
            Self::NoMatch { .. } => exit_code::NO_MATCH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Config(_) | Self::ConfigExists { .. } => {
                exit_code::USAGE
            }
            Self::Io(_) => exit_code::GENERAL,
        }
    }

    /// Attach the backend URL to a transport failure.
    pub fn from_api(err: ApiError, url: &url::Url) -> Self {
        match err.status {
            Some(status) => Self::Backend {
                family: err.family.to_string(),
                message: err.status_text().to_owned(),
                status,
            },
            None => Self::ConnectionFailed {
                code: err.code().to_owned(),
                url: url.to_string(),
            },
        }
    }
}

impl From<visor_api::Error> for CliError {
    fn from(err: visor_api::Error) -> Self {
        Self::Client {
            reason: err.to_string(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl CliError {
    /// Every core failure goes through here; its class picks the variant
    /// and with it the exit code.
    pub fn from_core(err: CoreError, url: &url::Url) -> Self {
        match (err.class(), err) {
            (_, CoreError::Transport(api) | CoreError::Degraded(api)) => Self::from_api(api, url),
            (ErrorClass::NoMatch, CoreError::NoMatch { best }) => Self::NoMatch {
                detail: match best {
                    Some(best) => format!(
                        "Closest match: {} ({:.3}), below the threshold.",
                        best.name, best.score
                    ),
                    None => "No registered face was found in the frame.".into(),
                },
            },
            (class, err) => Self::Validation {
                field: class.to_string(),
                reason: err.to_string(),
            },
        }
    }
}
