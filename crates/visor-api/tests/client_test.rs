#![allow(clippy::unwrap_used)]
// Integration tests for `VisionClient` using wiremock.

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use visor_api::{EndpointFamily, ImageFile, ImageSource, VisionClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, VisionClient) {
    let server = MockServer::start().await;
    let client = VisionClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Status endpoints ────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "camera": true, "model": false, "uploader": true
        })))
        .mount(&server)
        .await;

    let health = client.health().await.unwrap();
    assert!(health.ok && health.camera && health.uploader);
    assert!(!health.model);
}

#[tokio::test]
async fn test_detections() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/detections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timestamp": "t1",
            "objects": [{"label": "person", "confidence": 0.92, "bbox": [1, 2, 3, 4]}]
        })))
        .mount(&server)
        .await;

    let d = client.detections().await.unwrap();
    assert_eq!(d.timestamp.as_deref(), Some("t1"));
    assert_eq!(d.objects.len(), 1);
    assert_eq!(d.objects[0].label, "person");
}

#[tokio::test]
async fn test_capture_cooldown_uses_backend_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/capture"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"ok": false, "error": "cooldown"})),
        )
        .mount(&server)
        .await;

    let err = client.capture().await.unwrap_err();
    assert_eq!(err.family, EndpointFamily::Capture);
    assert_eq!(err.status, Some(429));
    assert_eq!(err.status_text(), "cooldown");
}

// ── Failure normalization ───────────────────────────────────────────

#[tokio::test]
async fn test_status_without_message_uses_family_code() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.health().await.unwrap_err();
    assert_eq!(err.to_string(), "health_failed");
}

#[tokio::test]
async fn test_malformed_body_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/detections"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client.detections().await.unwrap_err();
    assert_eq!(err.code(), "detections_failed");
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn test_connection_refused_is_an_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = VisionClient::from_reqwest(&uri, reqwest::Client::new()).unwrap();
    let err = client.timeline(80).await.unwrap_err();
    assert_eq!(err.status_text(), "timeline_failed");
}

// ── Multipart endpoints ─────────────────────────────────────────────

#[tokio::test]
async fn test_register_face_sends_name_and_source() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/face/register"))
        .and(body_string_contains("Shami"))
        .and(body_string_contains("live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "id": 3, "name": "Shami", "meta": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client
        .register_face("Shami", &ImageSource::Live)
        .await
        .unwrap();
    assert_eq!(resp.id, Some(3));
}

#[tokio::test]
async fn test_recognize_upload_detail_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/face/recognize"))
        .and(body_string_contains("me.jpg"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "no_face"})))
        .mount(&server)
        .await;

    // Multipart matching needs a UTF-8 body, so the "image" is plain text.
    let file = ImageFile::new("me.jpg", "image/jpeg", b"jpegdata".to_vec());
    let err = client
        .recognize_face(&ImageSource::Upload(file))
        .await
        .unwrap_err();
    assert_eq!(err.status_text(), "no_face");
    assert_eq!(err.code(), "face_recognize_failed");
}

#[tokio::test]
async fn test_emotion_results() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/emotion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [{"label": "happy", "score": 0.8}, {"label": "sad", "score": 0.1}]
        })))
        .mount(&server)
        .await;

    let resp = client.emotion(&ImageSource::Live).await.unwrap();
    assert_eq!(resp.result.len(), 2);
    assert_eq!(resp.result[0].label, "happy");
}

// ── Records & analytics ─────────────────────────────────────────────

#[tokio::test]
async fn test_timeline_passes_limit() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/timeline"))
        .and(query_param("limit", "80"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{
                "id": 7, "name": null, "face_type": "unknown",
                "event_type": "seen", "created_at": "2024-01-01T00:00:00", "score": null
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let t = client.timeline(80).await.unwrap();
    assert_eq!(t.events[0].id, 7);
    assert_eq!(t.events[0].name, None);
}

#[tokio::test]
async fn test_security_last_and_unknown_frame() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/security/last"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"unknowns": [{"id": 4, "duration_s": 6.5, "alerted": true}], "threshold_s": 5}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/security/unknown-frame"))
        .and(query_param("unknown_id", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF_u8, 0xD8, 0xFF, 0xD9]))
        .mount(&server)
        .await;

    let sec = client.security_last().await.unwrap();
    let result = sec.result.unwrap();
    assert!(result.unknowns[0].alerted);
    assert_eq!(result.threshold_s, Some(5.0));

    let frame = client.unknown_frame(4).await.unwrap();
    assert_eq!(frame.len(), 4);
}

// ── Video stream ────────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_url_is_pure_function_of_nonce() {
    let (server, client) = setup().await;
    let a = client.stream_url(1).unwrap();
    let b = client.stream_url(1).unwrap();
    let c = client.stream_url(2).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.as_str(), format!("{}/video-stream?t=1", server.uri()));
}

#[tokio::test]
async fn test_open_stream_yields_frames() {
    let (server, client) = setup().await;

    let mut body = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
    body.extend_from_slice(&[0xFF, 0xD8, 1, 2, 3, 0xFF, 0xD9]);
    body.extend_from_slice(b"\r\n--frame\r\nContent-Type: image/jpeg\r\n\r\n");
    body.extend_from_slice(&[0xFF, 0xD8, 4, 0xFF, 0xD9]);

    Mock::given(method("GET"))
        .and(path("/video-stream"))
        .and(query_param("t", "9"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "multipart/x-mixed-replace; boundary=frame")
                .set_body_bytes(body),
        )
        .mount(&server)
        .await;

    let frames: Vec<_> = client.open_stream(9).await.unwrap().collect().await;
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].as_ref().unwrap().as_ref(), &[0xFF, 0xD8, 4, 0xFF, 0xD9]);
}

#[tokio::test]
async fn test_open_stream_failure_is_stream_failed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/video-stream"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let Err(err) = client.open_stream(1).await else {
        panic!("expected stream open to fail");
    };
    assert_eq!(err.status_text(), "stream_failed");
}
