//! Shared configuration for the visor CLI and TUI.
//!
//! Defaults, a TOML file and `VISOR_*` environment variables are layered
//! with figment, validated, and translated into `visor_core::DashboardConfig`
//! plus the `visor_api::TransportConfig` the client is built with. Neither
//! core nor api ever read files themselves.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use visor_api::{TlsMode, TransportConfig};
use visor_core::{AuthConfig, DashboardConfig, PollingConfig, StreamConfig};

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration shared by CLI and TUI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub polling: Polling,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub stream: Stream,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Backend {
    /// Backend base URL (e.g., "http://192.168.1.20:8000").
    pub base_url: String,
    pub timeout_secs: u64,
    /// Accept any TLS certificate.
    pub insecure: bool,
    /// Path to a custom CA certificate (PEM).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 10,
            insecure: false,
            ca_cert: None,
        }
    }
}

/// Poll periods in milliseconds, plus list limits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Polling {
    pub health_ms: u64,
    pub detections_ms: u64,
    pub audio_ms: u64,
    pub security_ms: u64,
    pub action_ms: u64,
    pub timeline_ms: u64,
    pub attendance_ms: u64,
    pub face_last_ms: u64,
    pub timeline_limit: u32,
    pub attendance_limit: u32,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            health_ms: 3000,
            detections_ms: 800,
            audio_ms: 3000,
            security_ms: 2000,
            action_ms: 5000,
            timeline_ms: 5000,
            attendance_ms: 5000,
            face_last_ms: 5000,
            timeline_limit: 80,
            attendance_limit: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Auth {
    pub threshold: f64,
    pub period_ms: u64,
    pub auto_login: bool,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            threshold: visor_core::DEFAULT_AUTH_THRESHOLD,
            period_ms: 4000,
            auto_login: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Stream {
    pub refresh_secs: u64,
    pub retry_ms: u64,
}

impl Default for Stream {
    fn default() -> Self {
        Self {
            refresh_secs: 60,
            retry_ms: 1000,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "visor", "visor").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("visor");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VISOR_").split("__"))
}

/// Load from the canonical path + environment, then validate.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment, then validate. A missing file
/// just contributes nothing.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config = extract_config(path)?;
    config.validate()?;
    Ok(config)
}

/// Layer defaults, `path` and the environment without validating, for
/// callers that apply their own overrides first.
pub fn extract_config(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment(path).extract()?)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        let p = &self.polling;
        let periods = [
            ("polling.health_ms", p.health_ms),
            ("polling.detections_ms", p.detections_ms),
            ("polling.audio_ms", p.audio_ms),
            ("polling.security_ms", p.security_ms),
            ("polling.action_ms", p.action_ms),
            ("polling.timeline_ms", p.timeline_ms),
            ("polling.attendance_ms", p.attendance_ms),
            ("polling.face_last_ms", p.face_last_ms),
            ("auth.period_ms", self.auth.period_ms),
            ("stream.refresh_secs", self.stream.refresh_secs),
            ("stream.retry_ms", self.stream.retry_ms),
            ("backend.timeout_secs", self.backend.timeout_secs),
        ];
        if let Some((field, _)) = periods.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::invalid(field, "must be greater than zero"));
        }

        if !(0.0..=1.0).contains(&self.auth.threshold) {
            return Err(ConfigError::invalid(
                "auth.threshold",
                format!("expected a value in [0, 1], got {}", self.auth.threshold),
            ));
        }
        Ok(())
    }

    /// The configured backend URL, parsed.
    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        let url: url::Url = self.backend.base_url.parse().map_err(|_| {
            ConfigError::invalid(
                "backend.base_url",
                format!("invalid URL: {}", self.backend.base_url),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "backend.base_url",
                format!("expected an http(s) URL, got {url}"),
            ));
        }
        Ok(url)
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.backend.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.backend.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.backend.timeout_secs),
            ..TransportConfig::default()
        }
    }

    pub fn dashboard(&self) -> DashboardConfig {
        let p = &self.polling;
        let ms = Duration::from_millis;
        DashboardConfig {
            polling: PollingConfig {
                health: ms(p.health_ms),
                detections: ms(p.detections_ms),
                audio: ms(p.audio_ms),
                security: ms(p.security_ms),
                action: ms(p.action_ms),
                timeline: ms(p.timeline_ms),
                attendance: ms(p.attendance_ms),
                face_last: ms(p.face_last_ms),
                timeline_limit: p.timeline_limit,
                attendance_limit: p.attendance_limit,
            },
            auth: AuthConfig {
                threshold: self.auth.threshold,
                period: ms(self.auth.period_ms),
                auto_login: self.auth.auto_login,
            },
            stream: StreamConfig {
                retry_delay: ms(self.stream.retry_ms),
                refresh_interval: Duration::from_secs(self.stream.refresh_secs),
            },
        }
    }
}
