//! Health, detections and capture handlers.

use tabled::Tabled;
use visor_api::VisionClient;
use visor_api::models::{DetectedObject, Health};
use visor_core::panels::view;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DetectionRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "BBox")]
    bbox: String,
}

impl From<&DetectedObject> for DetectionRow {
    fn from(o: &DetectedObject) -> Self {
        let bbox: Vec<String> = o.bbox.iter().map(ToString::to_string).collect();
        Self {
            label: o.label.clone(),
            confidence: format!("{:.0}%", o.confidence * 100.0),
            bbox: format!("[{}]", bbox.join(", ")),
        }
    }
}

pub fn health_lines(health: &Health, color: bool) -> Vec<String> {
    view::health_indicators(Some(health))
        .iter()
        .map(|(label, state, up)| output::indicator(label, state, *up, color))
        .collect()
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn health(client: &VisionClient, global: &GlobalOpts) -> Result<(), CliError> {
    let health = util::check(client, client.health().await)?;
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, &health, |h| health_lines(h, color));
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn detections(client: &VisionClient, global: &GlobalOpts) -> Result<(), CliError> {
    let detections = util::check(client, client.detections().await)?;

    let out = match global.output {
        OutputFormat::Table if !detections.objects.is_empty() => {
            let table = output::render_list(
                &global.output,
                &detections.objects,
                |o| DetectionRow::from(o),
                |o| o.label.clone(),
            );
            format!("{}\n{table}", view::last_update(Some(&detections)))
        }
        OutputFormat::Plain => output::render_list(
            &global.output,
            &detections.objects,
            |o| DetectionRow::from(o),
            |o| o.label.clone(),
        ),
        _ => output::render_single(&global.output, &detections, |d| {
            let mut lines = vec![view::last_update(Some(d))];
            lines.extend(view::detection_lines(Some(d)));
            lines
        }),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn capture(client: &VisionClient, global: &GlobalOpts) -> Result<(), CliError> {
    let resp = util::check(client, client.capture().await)?;
    let out = output::render_single(&global.output, &resp, |r| {
        if r.ok {
            let mut lines = vec!["uploaded".to_owned()];
            lines.extend(r.upload_url.clone());
            lines
        } else {
            match &r.error {
                Some(err) => vec![format!("failed: {err}")],
                None => vec!["failed".to_owned()],
            }
        }
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
