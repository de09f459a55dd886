// Wire types for the vision backend.
//
// Only the fields the dashboard consumes are modelled. Every struct is
// lenient: missing fields default, unknown fields are ignored, so a newer
// backend never breaks an older dashboard.

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

// ── Status & detections ─────────────────────────────────────────────

/// `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    pub ok: bool,
    pub camera: bool,
    pub model: bool,
    pub uploader: bool,
}

/// `GET /detections`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detections {
    pub timestamp: Option<String>,
    pub objects: Vec<DetectedObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f64,
    /// `[x, y, w, h]` in frame pixels.
    #[serde(default)]
    pub bbox: [f64; 4],
}

/// `POST /capture`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureResponse {
    pub ok: bool,
    pub upload_url: Option<String>,
    pub error: Option<String>,
}

// ── Faces ───────────────────────────────────────────────────────────

/// A single identity match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceMatch {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub score: f64,
}

/// `POST /face/recognize`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizeResponse {
    pub best: Option<FaceMatch>,
    pub matches: Vec<FaceMatch>,
    pub threshold: Option<f64>,
}

/// `POST /face/register`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterResponse {
    pub ok: bool,
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// `GET /face/last`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceLast {
    pub result: Option<FaceLastResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceLastResult {
    pub best: Option<FaceMatch>,
}

// ── Classification results ──────────────────────────────────────────

/// A `{label, score}` pair used by emotion, action and audio results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// `POST /emotion`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionResponse {
    /// Labels in backend order. A non-list upstream payload decodes as empty.
    #[serde(deserialize_with = "lenient_vec")]
    pub result: Vec<LabelScore>,
}

/// `GET /action/last`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLast {
    pub result: Option<ActionResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionResult {
    pub best: Option<LabelScore>,
    #[serde(deserialize_with = "lenient_vec")]
    pub topk: Vec<LabelScore>,
}

/// `GET /audio/last`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioLast {
    pub result: Option<AudioResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioResult {
    pub alert: Option<LabelScore>,
    #[serde(deserialize_with = "lenient_vec")]
    pub results: Vec<LabelScore>,
}

// ── Security & records ──────────────────────────────────────────────

/// `GET /security/last`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityLast {
    pub result: Option<SecurityResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityResult {
    pub unknowns: Vec<UnknownFace>,
    pub threshold_s: Option<f64>,
}

/// An unidentified face currently tracked by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownFace {
    pub id: u64,
    #[serde(default)]
    pub duration_s: f64,
    #[serde(default)]
    pub alerted: bool,
}

/// `GET /timeline?limit=N`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeline {
    pub events: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub face_type: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// `GET /attendance?limit=N`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attendance {
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub name: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub last_seen: String,
}

// ── Request inputs ──────────────────────────────────────────────────

/// An image supplied by the operator for upload-mode endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub filename: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(filename: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an image from disk, guessing the MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        let mime = match path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            _ => "application/octet-stream",
        };
        Ok(Self::new(filename, mime, bytes))
    }
}

/// Where the backend should take the analysed image from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// The backend grabs the current camera frame.
    Live,
    /// The operator-supplied image.
    Upload(ImageFile),
}

impl ImageSource {
    /// Value of the multipart `source` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Upload(_) => "upload",
        }
    }
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn detections_decode_integer_bbox() {
        let d: Detections = serde_json::from_value(json!({
            "timestamp": "t1",
            "objects": [{"label": "person", "confidence": 0.92, "bbox": [1, 2, 3, 4]}]
        }))
        .expect("valid detections");
        assert_eq!(d.timestamp.as_deref(), Some("t1"));
        assert_eq!(d.objects[0].bbox, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn emotion_upstream_error_object_decodes_empty() {
        let e: EmotionResponse =
            serde_json::from_value(json!({"ok": true, "result": {"error": "loading"}}))
                .expect("lenient");
        assert!(e.result.is_empty());
    }

    #[test]
    fn face_last_without_result() {
        let f: FaceLast = serde_json::from_value(json!({"ok": true, "result": null}))
            .expect("null result");
        assert_eq!(f.result, None);
    }

    #[test]
    fn image_mime_from_extension() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("snapshot.JPG");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xD9]).expect("write");
        let img = ImageFile::from_path(&path).expect("read back");
        assert_eq!(img.mime, "image/jpeg");
        assert_eq!(img.filename, "snapshot.JPG");
        assert_eq!(img.bytes.len(), 4);
    }
}
