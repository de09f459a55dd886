//! `watch`: poll one panel at its period and print every result.
//!
//! Uses the same `Poller` as the dashboard, so overlapping ticks and
//! post-stop silence behave exactly as they do on screen.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use visor_api::models::{
    ActionLast, Attendance, AudioLast, Detections, FaceLast, Health, SecurityLast, Timeline,
};
use visor_api::{EndpointResult, VisionClient};
use visor_core::panels::{fetch_with, view};
use visor_core::{CoreError, PollHandle, Poller, PollingConfig};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs, WatchPanel};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

use super::status;

fn default_period(panel: WatchPanel, polling: &PollingConfig) -> Duration {
    match panel {
        WatchPanel::Health => polling.health,
        WatchPanel::Detections => polling.detections,
        WatchPanel::Action => polling.action,
        WatchPanel::Audio => polling.audio,
        WatchPanel::Security => polling.security,
        WatchPanel::Timeline => polling.timeline,
        WatchPanel::Attendance => polling.attendance,
        WatchPanel::Face => polling.face_last,
    }
}

/// A failed tick: `<class>: <failure text>`. Polling continues.
fn degraded_line(err: &CoreError) -> String {
    format!("{}: {err}", err.class())
}

/// Start `poller` on `fetch`, rendering each result into `tx`.
fn spawn_watch<T, F, Fut, R>(
    poller: Poller,
    client: &VisionClient,
    fetch: F,
    format: &OutputFormat,
    render: R,
    tx: mpsc::UnboundedSender<String>,
) -> PollHandle
where
    T: Serialize + Send + 'static,
    F: Fn(VisionClient) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = EndpointResult<T>> + Send + 'static,
    R: Fn(&T) -> Vec<String> + Send + Sync + 'static,
{
    let format = format.clone();
    poller.start(fetch_with(client, fetch), move |result: EndpointResult<T>| {
        let text = match result {
            Ok(payload) => output::render_single(&format, &payload, &render),
            Err(err) => degraded_line(&CoreError::Degraded(err)),
        };
        let _ = tx.send(text);
    })
}

pub async fn handle(
    client: &VisionClient,
    args: WatchArgs,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let polling = cfg.dashboard().polling;
    let period = args
        .every
        .unwrap_or_else(|| default_period(args.panel, &polling));
    if period.is_zero() {
        return Err(CliError::Validation {
            field: "every".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = Poller::new(period).named("watch");
    let fmt = &global.output;
    let color = output::should_color(&global.color);

    let handle = match args.panel {
        WatchPanel::Health => spawn_watch(
            poller,
            client,
            |c| async move { c.health().await },
            fmt,
            move |h: &Health| status::health_lines(h, color),
            tx,
        ),
        WatchPanel::Detections => spawn_watch(
            poller,
            client,
            |c| async move { c.detections().await },
            fmt,
            |d: &Detections| {
                let mut lines = vec![view::last_update(Some(d))];
                lines.extend(view::detection_lines(Some(d)));
                lines
            },
            tx,
        ),
        WatchPanel::Action => spawn_watch(
            poller,
            client,
            |c| async move { c.action_last().await },
            fmt,
            |a: &ActionLast| view::action_lines(a.result.as_ref()),
            tx,
        ),
        WatchPanel::Audio => spawn_watch(
            poller,
            client,
            |c| async move { c.audio_last().await },
            fmt,
            |a: &AudioLast| view::audio_lines(a.result.as_ref()),
            tx,
        ),
        WatchPanel::Security => spawn_watch(
            poller,
            client,
            |c| async move { c.security_last().await },
            fmt,
            |s: &SecurityLast| view::security_lines(s.result.as_ref()),
            tx,
        ),
        WatchPanel::Timeline => {
            let limit = polling.timeline_limit;
            spawn_watch(
                poller,
                client,
                move |c| async move { c.timeline(limit).await },
                fmt,
                |t: &Timeline| view::timeline_lines(Some(t)),
                tx,
            )
        }
        WatchPanel::Attendance => {
            let limit = polling.attendance_limit;
            spawn_watch(
                poller,
                client,
                move |c| async move { c.attendance(limit).await },
                fmt,
                |a: &Attendance| view::attendance_lines(Some(a)),
                tx,
            )
        }
        WatchPanel::Face => spawn_watch(
            poller,
            client,
            |c| async move { c.face_last().await },
            fmt,
            |l: &FaceLast| vec![view::auto_recognition_line(Some(l))],
            tx,
        ),
    };

    let mut seen: u64 = 0;
    loop {
        tokio::select! {
            text = rx.recv() => {
                let Some(text) = text else { break };
                seen += 1;
                if matches!(global.output, OutputFormat::Table) && !global.quiet {
                    println!("── {} ──", chrono::Local::now().format("%H:%M:%S"));
                }
                output::print_output(&text, global.quiet);
                if args.count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop();
    Ok(())
}
