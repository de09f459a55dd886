// Text view models for panel payloads.
//
// Pure functions from payloads to the lines a front end shows. Both the
// TUI and the CLI `watch` command render through these.

use visor_api::models::{
    ActionResult, Attendance, AudioResult, Detections, FaceLast, Health, LabelScore,
    SecurityResult, Timeline, TimelineEvent,
};

use crate::session::Identity;

/// Alert threshold shown when the backend does not report one.
pub const DEFAULT_SECURITY_THRESHOLD_S: f64 = 5.0;

/// Number of audio results shown.
pub const AUDIO_TOP_N: usize = 5;

// ── Health ──────────────────────────────────────────────────────────

/// `(label, state word, healthy)` for each backend component.
pub fn health_indicators(health: Option<&Health>) -> [(&'static str, &'static str, bool); 4] {
    let h = health.cloned().unwrap_or_default();
    [
        ("Backend", "Online", h.ok),
        ("Camera", "Ready", h.camera),
        ("Model", "Loaded", h.model),
        ("Uploader", "Active", h.uploader),
    ]
}

// ── Detections ──────────────────────────────────────────────────────

pub fn last_update(detections: Option<&Detections>) -> String {
    let ts = detections
        .and_then(|d| d.timestamp.as_deref())
        .filter(|t| !t.is_empty())
        .unwrap_or("-");
    format!("Last update: {ts}")
}

pub fn detection_lines(detections: Option<&Detections>) -> Vec<String> {
    let objects = detections.map(|d| d.objects.as_slice()).unwrap_or_default();
    if objects.is_empty() {
        return vec!["No objects detected".into()];
    }
    objects
        .iter()
        .map(|o| {
            let bbox: Vec<String> = o.bbox.iter().map(ToString::to_string).collect();
            format!(
                "{}  {}%  [{}]",
                o.label,
                percent(o.confidence),
                bbox.join(", ")
            )
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn percent(confidence: f64) -> i64 {
    (confidence * 100.0).round() as i64
}

// ── Scores ──────────────────────────────────────────────────────────

/// `label  0.123` for each of the first `limit` entries.
pub fn score_lines(items: &[LabelScore], limit: usize) -> Vec<String> {
    items
        .iter()
        .take(limit)
        .map(|i| format!("{}  {:.3}", i.label, i.score))
        .collect()
}

pub fn action_lines(result: Option<&ActionResult>) -> Vec<String> {
    let Some(result) = result else {
        return Vec::new();
    };
    let mut lines: Vec<String> = result
        .best
        .iter()
        .map(|b| format!("{} ({:.3})", b.label, b.score))
        .collect();
    lines.extend(score_lines(&result.topk, usize::MAX));
    lines
}

pub fn audio_lines(result: Option<&AudioResult>) -> Vec<String> {
    let mut lines = vec![match result.and_then(|r| r.alert.as_ref()) {
        Some(alert) => format!("{} ({:.3})", alert.label, alert.score),
        None => "No alert detected.".into(),
    }];
    if let Some(result) = result {
        lines.extend(score_lines(&result.results, AUDIO_TOP_N));
    }
    lines
}

// ── Faces & session ─────────────────────────────────────────────────

pub fn auto_recognition_line(last: Option<&FaceLast>) -> String {
    match last.and_then(|l| l.result.as_ref()).and_then(|r| r.best.as_ref()) {
        Some(best) => format!("Auto recognition: {} ({:.3})", best.name, best.score),
        None => "Auto recognition: unknown".into(),
    }
}

pub fn session_line(identity: &Identity) -> String {
    format!("{} {:.2}", identity.name, identity.score)
}

// ── Records ─────────────────────────────────────────────────────────

pub fn timeline_lines(timeline: Option<&Timeline>) -> Vec<String> {
    let events = timeline.map(|t| t.events.as_slice()).unwrap_or_default();
    if events.is_empty() {
        return vec!["No events yet.".into()];
    }
    events.iter().map(timeline_line).collect()
}

/// `Name (face type) event · timestamp`, plus ` score 0.123` when scored.
pub fn timeline_line(event: &TimelineEvent) -> String {
    let name = event
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown");
    let mut line = format!(
        "{name} ({}) {} · {}",
        event.face_type, event.event_type, event.created_at
    );
    if let Some(score) = event.score {
        line.push_str(&format!(" score {score:.3}"));
    }
    line
}

pub fn attendance_lines(attendance: Option<&Attendance>) -> Vec<String> {
    let records = attendance.map(|a| a.records.as_slice()).unwrap_or_default();
    if records.is_empty() {
        return vec!["No attendance records yet.".into()];
    }
    records
        .iter()
        .map(|r| format!("{}  {}  Last seen: {}", r.name, r.total, r.last_seen))
        .collect()
}

// ── Security ────────────────────────────────────────────────────────

pub fn security_lines(result: Option<&SecurityResult>) -> Vec<String> {
    let unknowns = result.map(|r| r.unknowns.as_slice()).unwrap_or_default();
    let threshold = result
        .and_then(|r| r.threshold_s)
        .unwrap_or(DEFAULT_SECURITY_THRESHOLD_S);

    let mut lines = vec![
        format!("Unknowns detected: {}", unknowns.len()),
        format!("Alert after {threshold}s of continuous presence."),
    ];
    if unknowns.is_empty() {
        lines.push("No unknown faces currently detected.".into());
    } else {
        lines.extend(unknowns.iter().map(|u| {
            if u.alerted {
                format!("Unknown #{}  ALERT", u.id)
            } else {
                format!("Unknown #{}  {}s", u.id, u.duration_s)
            }
        }));
    }
    lines
}

/// Unknown face whose frame is previewed: the first one listed.
pub fn security_preview(result: Option<&SecurityResult>) -> Option<u64> {
    result.and_then(|r| r.unknowns.first()).map(|u| u.id)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use visor_api::models::{
        AttendanceRecord, DetectedObject, FaceLastResult, FaceMatch, UnknownFace,
    };

    use super::*;

    #[test]
    fn detections_render_rounded_confidence_and_bbox() {
        let d = Detections {
            timestamp: Some("t1".into()),
            objects: vec![DetectedObject {
                label: "person".into(),
                confidence: 0.92,
                bbox: [1.0, 2.0, 3.0, 4.0],
            }],
        };
        assert_eq!(last_update(Some(&d)), "Last update: t1");
        assert_eq!(detection_lines(Some(&d)), vec!["person  92%  [1, 2, 3, 4]"]);
    }

    #[test]
    fn empty_detections() {
        let d = Detections {
            timestamp: None,
            objects: Vec::new(),
        };
        assert_eq!(last_update(Some(&d)), "Last update: -");
        assert_eq!(detection_lines(Some(&d)), vec!["No objects detected"]);
        assert_eq!(detection_lines(None), vec!["No objects detected"]);
    }

    #[test]
    fn missing_health_is_all_down() {
        assert!(health_indicators(None).iter().all(|(_, _, up)| !up));
    }

    #[test]
    fn timeline_unknown_name_and_optional_score() {
        let t = Timeline {
            events: vec![
                TimelineEvent {
                    id: 1,
                    name: None,
                    face_type: "unknown".into(),
                    event_type: "seen".into(),
                    created_at: "2024-05-01 10:00".into(),
                    score: None,
                },
                TimelineEvent {
                    id: 2,
                    name: Some("Shami".into()),
                    face_type: "known".into(),
                    event_type: "seen".into(),
                    created_at: "2024-05-01 10:01".into(),
                    score: Some(0.6123),
                },
            ],
        };
        assert_eq!(
            timeline_lines(Some(&t)),
            vec![
                "Unknown (unknown) seen · 2024-05-01 10:00",
                "Shami (known) seen · 2024-05-01 10:01 score 0.612",
            ]
        );
        assert_eq!(timeline_lines(None), vec!["No events yet."]);
    }

    #[test]
    fn security_alert_and_duration() {
        let r = SecurityResult {
            unknowns: vec![
                UnknownFace {
                    id: 4,
                    duration_s: 6.5,
                    alerted: true,
                },
                UnknownFace {
                    id: 5,
                    duration_s: 2.0,
                    alerted: false,
                },
            ],
            threshold_s: None,
        };
        assert_eq!(
            security_lines(Some(&r)),
            vec![
                "Unknowns detected: 2",
                "Alert after 5s of continuous presence.",
                "Unknown #4  ALERT",
                "Unknown #5  2s",
            ]
        );
        assert_eq!(security_preview(Some(&r)), Some(4));
    }

    #[test]
    fn audio_without_alert() {
        let r = AudioResult {
            alert: None,
            results: (0..7)
                .map(|i| LabelScore {
                    label: format!("l{i}"),
                    score: 0.1,
                })
                .collect(),
        };
        let lines = audio_lines(Some(&r));
        assert_eq!(lines[0], "No alert detected.");
        assert_eq!(lines.len(), 1 + AUDIO_TOP_N);
    }

    #[test]
    fn attendance_and_auto_recognition() {
        let a = Attendance {
            records: vec![AttendanceRecord {
                name: "Shami".into(),
                total: 3,
                last_seen: "10:02".into(),
            }],
        };
        assert_eq!(attendance_lines(Some(&a)), vec!["Shami  3  Last seen: 10:02"]);

        let last = FaceLast {
            result: Some(FaceLastResult {
                best: Some(FaceMatch {
                    id: None,
                    name: "Shami".into(),
                    score: 0.5,
                }),
            }),
        };
        assert_eq!(
            auto_recognition_line(Some(&last)),
            "Auto recognition: Shami (0.500)"
        );
        assert_eq!(auto_recognition_line(None), "Auto recognition: unknown");
    }
}
