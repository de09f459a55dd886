//! Save frames from the live MJPEG stream.
//!
//! Runs the same reconnecting feed as the dashboard, so a dropped stream
//! is retried after the configured delay instead of failing the command.

use tokio::sync::mpsc;
use tracing::debug;
use visor_api::VisionClient;
use visor_core::{StreamFeed, StreamReconnector};

use crate::cli::{GlobalOpts, StreamArgs};
use crate::config::Config;
use crate::error::CliError;

use super::util;

pub async fn handle(
    client: &VisionClient,
    args: StreamArgs,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    std::fs::create_dir_all(&args.dir)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reconnector = StreamReconnector::start(cfg.dashboard().stream);
    let feed = StreamFeed::spawn(reconnector.clone(), client.clone(), move |frame| {
        let _ = tx.send(frame);
    });

    let result = async {
        let mut saved = 0;
        while saved < args.frames {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else { break };
                    saved += 1;
                    let path = args.dir.join(format!("frame-{saved:04}.jpg"));
                    std::fs::write(&path, &frame)?;
                    debug!(path = %path.display(), "frame saved");
                    if !global.quiet {
                        eprintln!("{} ({})", path.display(), util::byte_size(frame.len()));
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        Ok::<(), CliError>(())
    }
    .await;

    reconnector.stop();
    let _ = feed.await;
    result
}
