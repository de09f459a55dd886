//! Face registration / recognition and emotion handlers.

use visor_api::VisionClient;
use visor_api::models::LabelScore;
use visor_core::ValidationCode;
use visor_core::panels::{EMOTION_TOP_N, view};

use crate::cli::{FaceArgs, FaceCommand, GlobalOpts, ImageArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    client: &VisionClient,
    args: FaceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        FaceCommand::Register { name, image } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(util::fail(client, ValidationCode::NameRequired.into()));
            }
            let source = util::image_source(image.image.as_deref())?;
            let resp = util::check(client, client.register_face(name, &source).await)?;
            let out = output::render_single(&global.output, &resp, |r| {
                let shown = r.name.as_deref().unwrap_or(name);
                match r.id {
                    Some(id) => vec![format!("registered {shown} (id {id})")],
                    None => vec![format!("registered {shown}")],
                }
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FaceCommand::Recognize(image) => {
            let source = util::image_source(image.image.as_deref())?;
            let resp = util::check(client, client.recognize_face(&source).await)?;
            let out = output::render_single(&global.output, &resp, |r| match &r.best {
                Some(best) => vec![format!("matched {} ({:.3})", best.name, best.score)],
                None => vec!["unknown".to_owned()],
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FaceCommand::Last => {
            let last = util::check(client, client.face_last().await)?;
            let out = output::render_single(&global.output, &last, |l| {
                vec![view::auto_recognition_line(Some(l))]
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

pub async fn emotion(
    client: &VisionClient,
    args: ImageArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let source = util::image_source(args.image.as_deref())?;
    let resp = util::check(client, client.emotion(&source).await)?;
    let top: Vec<LabelScore> = resp.result.into_iter().take(EMOTION_TOP_N).collect();
    let out = output::render_single(&global.output, &top, |r| {
        view::score_lines(r, EMOTION_TOP_N)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
