//! `login`: run the face-ID gate until a session exists.
//!
//! Drives the same `AuthGate` the dashboard's login screen uses: scheduled
//! attempts every period, or a single manual scan with `--once`.

use std::time::Duration;

use tokio::time::Instant;
use visor_api::VisionClient;
use visor_core::panels::view;
use visor_core::{AuthGate, AuthOutcome, CoreError, Identity, SessionStore};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    client: &VisionClient,
    args: LoginArgs,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut auth = cfg.dashboard().auth;
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CliError::Validation {
                field: "threshold".into(),
                reason: format!("expected a value in [0, 1], got {threshold}"),
            });
        }
        auth.threshold = threshold;
    }
    auth.auto_login = !args.once;

    let session = SessionStore::new();
    let gate = AuthGate::new(client.clone(), session.clone(), auth);

    let identity = if args.once {
        gate.arm();
        let outcome = gate.scan_now().await;
        gate.disarm();
        outcome
            .unwrap_or(AuthOutcome::NoMatch { best: None })
            .into_result()
            .map_err(|err| util::fail(client, err))?
    } else {
        let identity = wait_for_session(client, &gate, &session, args.wait, global.quiet).await;
        gate.disarm();
        identity?
    };

    let out = output::render_single(&global.output, &identity, |i| {
        vec![format!("Logged in as {}", view::session_line(i))]
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Arm the gate and report attempts until the session appears.
async fn wait_for_session(
    client: &VisionClient,
    gate: &AuthGate<VisionClient>,
    session: &SessionStore,
    wait: Option<Duration>,
    quiet: bool,
) -> Result<Identity, CliError> {
    let mut sessions = session.subscribe();
    let mut attempts = gate.subscribe();
    gate.arm();

    let deadline = wait.map(|w| Instant::now() + w);
    let mut last_line = String::new();

    loop {
        if let Some(identity) = sessions.borrow_and_update().clone() {
            return Ok(identity);
        }

        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            changed = sessions.changed() => {
                if changed.is_err() {
                    return Err(util::fail(client, CoreError::NoMatch { best: None }));
                }
            }
            changed = attempts.changed() => {
                if changed.is_err() {
                    continue;
                }
                let line = attempts.borrow_and_update().status_line();
                if !quiet && line != last_line {
                    eprintln!("{line}");
                }
                last_line = line;
            }
            () = expired => {
                return Err(CliError::Timeout {
                    seconds: wait.map_or(0, |w| w.as_secs()),
                });
            }
            _ = tokio::signal::ctrl_c() => {
                return Err(util::fail(client, CoreError::NoMatch { best: None }));
            }
        }
    }
}
