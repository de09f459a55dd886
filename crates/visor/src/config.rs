//! CLI-aware configuration: the shared config crate plus `GlobalOpts`
//! overrides.

use std::path::PathBuf;

use visor_api::VisionClient;
pub use visor_config::{Config, config_path, save_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file this invocation reads: `--config` or the default path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the effective config: defaults, file, environment, then flags.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = visor_config::extract_config(&config_file(global))?;
    if let Some(ref url) = global.url {
        cfg.backend.base_url.clone_from(url);
    }
    if global.insecure {
        cfg.backend.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.backend.timeout_secs = timeout;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Build the backend client described by `cfg`.
pub fn build_client(cfg: &Config) -> Result<VisionClient, CliError> {
    let url = cfg.base_url()?;
    Ok(VisionClient::new(url.as_str(), &cfg.transport())?)
}
