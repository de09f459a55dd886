//! Action, audio and security handlers.

use visor_api::VisionClient;
use visor_core::panels::view;

use crate::cli::{GlobalOpts, SecurityArgs, SecurityCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn action(client: &VisionClient, global: &GlobalOpts) -> Result<(), CliError> {
    let last = util::check(client, client.action_last().await)?;
    let out = output::render_single(&global.output, &last, |l| {
        let lines = view::action_lines(l.result.as_ref());
        if lines.is_empty() {
            vec!["No action result yet.".into()]
        } else {
            lines
        }
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn audio(client: &VisionClient, global: &GlobalOpts) -> Result<(), CliError> {
    let last = util::check(client, client.audio_last().await)?;
    let out = output::render_single(&global.output, &last, |l| {
        view::audio_lines(l.result.as_ref())
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn security(
    client: &VisionClient,
    args: SecurityArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command.unwrap_or(SecurityCommand::Status) {
        SecurityCommand::Status => {
            let last = util::check(client, client.security_last().await)?;
            let out = output::render_single(&global.output, &last, |l| {
                view::security_lines(l.result.as_ref())
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SecurityCommand::Frame { id, out } => {
            let frame = util::check(client, client.unknown_frame(id).await)?;
            std::fs::write(&out, &frame)?;
            if !global.quiet {
                eprintln!(
                    "Saved unknown #{id} to {} ({})",
                    out.display(),
                    util::byte_size(frame.len())
                );
            }
            Ok(())
        }
    }
}
