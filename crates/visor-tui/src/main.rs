//! `visor-tui`: live terminal dashboard for the visor vision backend.
//!
//! Built on [ratatui](https://ratatui.rs) over the `visor-core` dashboard
//! supervisor. The login screen runs the face-ID gate; once a session
//! exists the Dashboard (1) and Demos (2) views show their panels.
//!
//! Logs are written to a file (default `/tmp/visor-tui.log`) so they never
//! land on the terminal the UI draws into.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use visor_api::VisionClient;
use visor_config::Config;

use crate::app::App;

/// Terminal dashboard for the visor vision backend.
#[derive(Parser, Debug)]
#[command(name = "visor-tui", version, about)]
struct Cli {
    /// Backend base URL (e.g., http://localhost:8000)
    #[arg(short = 'u', long, env = "VISOR_URL")]
    url: Option<String>,

    /// Path to config file
    #[arg(long, env = "VISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Log file path (defaults to /tmp/visor-tui.log)
    #[arg(long, default_value = "/tmp/visor-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may reach stdout/stderr while the terminal
/// is in raw mode. The guard must live until exit so buffered lines flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "visor_tui={log_level},visor_core={log_level},visor_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("visor-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Effective config: defaults, file, environment, then flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(visor_config::config_path);
    let mut cfg = visor_config::extract_config(&path)?;
    if let Some(ref url) = cli.url {
        cfg.backend.base_url.clone_from(url);
    }
    if cli.insecure {
        cfg.backend.insecure = true;
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let cfg = load_config(&cli)?;
    let client = VisionClient::new(cfg.base_url()?.as_str(), &cfg.transport())?;
    info!(base_url = %client.base_url(), "starting visor-tui");

    let mut app = App::new(client, cfg.dashboard());
    app.run().await?;

    Ok(())
}
