//! Command dispatch: bridges CLI args -> client calls -> output formatting.

pub mod analytics;
pub mod config_cmd;
pub mod face;
pub mod login;
pub mod records;
pub mod status;
pub mod stream;
pub mod util;
pub mod watch;

use visor_api::VisionClient;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &VisionClient,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Health => status::health(client, global).await,
        Command::Detections => status::detections(client, global).await,
        Command::Capture => status::capture(client, global).await,
        Command::Face(args) => face::handle(client, args, global).await,
        Command::Emotion(args) => face::emotion(client, args, global).await,
        Command::Action => analytics::action(client, global).await,
        Command::Audio => analytics::audio(client, global).await,
        Command::Security(args) => analytics::security(client, args, global).await,
        Command::Timeline(args) => {
            let limit = args.limit.unwrap_or(cfg.polling.timeline_limit);
            records::timeline(client, limit, global).await
        }
        Command::Attendance(args) => {
            let limit = args.limit.unwrap_or(cfg.polling.attendance_limit);
            records::attendance(client, limit, global).await
        }
        Command::Stream(args) => stream::handle(client, args, cfg, global).await,
        Command::Watch(args) => watch::handle(client, args, cfg, global).await,
        Command::Login(args) => login::handle(client, args, cfg, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
