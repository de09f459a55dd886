//! Timeline and attendance handlers.

use tabled::Tabled;
use visor_api::VisionClient;
use visor_api::models::{AttendanceRecord, TimelineEvent};
use visor_core::panels::view;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Face")]
    face_type: String,
    #[tabled(rename = "Event")]
    event_type: String,
    #[tabled(rename = "Score")]
    score: String,
}

impl From<&TimelineEvent> for EventRow {
    fn from(e: &TimelineEvent) -> Self {
        Self {
            time: e.created_at.clone(),
            name: e
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown".into()),
            face_type: e.face_type.clone(),
            event_type: e.event_type.clone(),
            score: e.score.map(|s| format!("{s:.3}")).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct AttendanceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Total")]
    total: u64,
    #[tabled(rename = "Last seen")]
    last_seen: String,
}

impl From<&AttendanceRecord> for AttendanceRow {
    fn from(r: &AttendanceRecord) -> Self {
        Self {
            name: r.name.clone(),
            total: r.total,
            last_seen: r.last_seen.clone(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn timeline(client: &VisionClient, limit: u32, global: &GlobalOpts) -> Result<(), CliError> {
    let timeline = util::check(client, client.timeline(limit).await)?;
    let out = if timeline.events.is_empty() && matches!(global.output, OutputFormat::Table) {
        view::timeline_lines(None).join("\n")
    } else {
        output::render_list(
            &global.output,
            &timeline.events,
            |e| EventRow::from(e),
            view::timeline_line,
        )
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn attendance(
    client: &VisionClient,
    limit: u32,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let attendance = util::check(client, client.attendance(limit).await)?;
    let out = if attendance.records.is_empty() && matches!(global.output, OutputFormat::Table) {
        view::attendance_lines(None).join("\n")
    } else {
        output::render_list(
            &global.output,
            &attendance.records,
            |r| AttendanceRow::from(r),
            |r| format!("{}\t{}\t{}", r.name, r.total, r.last_seen),
        )
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
