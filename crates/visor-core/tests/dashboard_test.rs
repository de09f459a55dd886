#![allow(clippy::unwrap_used)]
// Phase supervision end to end against a mock backend (real time).

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use visor_api::{TransportConfig, VisionClient};
use visor_core::{
    AuthConfig, AuthStatus, Dashboard, DashboardConfig, Phase, PollingConfig, StreamConfig, View,
};

const WAIT: Duration = Duration::from_secs(10);

fn fast_config() -> DashboardConfig {
    let ms = Duration::from_millis;
    DashboardConfig {
        polling: PollingConfig {
            health: ms(100),
            detections: ms(100),
            audio: ms(100),
            security: ms(100),
            action: ms(100),
            timeline: ms(100),
            attendance: ms(100),
            face_last: ms(100),
            ..PollingConfig::default()
        },
        auth: AuthConfig {
            period: ms(100),
            ..AuthConfig::default()
        },
        stream: StreamConfig {
            retry_delay: ms(50),
            refresh_interval: Duration::from_secs(60),
        },
    }
}

/// Mount a full backend whose recognizer answers with `score`.
async fn mount_backend(server: &MockServer, score: f64) {
    let ok = |body: serde_json::Value| ResponseTemplate::new(200).set_body_json(body);

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ok(json!({"ok": true, "camera": true, "model": true, "uploader": false})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/face/recognize"))
        .respond_with(ok(json!({
            "ok": true, "best": {"id": 1, "name": "Shami", "score": score}, "matches": []
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detections"))
        .respond_with(ok(json!({"timestamp": "t1", "objects": []})))
        .mount(server)
        .await;
    for p in ["/action/last", "/audio/last", "/security/last"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ok(json!({"ok": true, "result": null})))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/timeline"))
        .respond_with(ok(json!({"events": []})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/attendance"))
        .respond_with(ok(json!({"records": []})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/video-stream"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

async fn start(score: f64) -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    mount_backend(&server, score).await;
    let client = VisionClient::new(&server.uri(), &TransportConfig::default()).unwrap();
    let dashboard = Dashboard::start(client, fast_config());
    (server, dashboard)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_mounts_panels_and_logout_rearms_gate() {
    let (server, dashboard) = start(0.8).await;
    let mut phase = dashboard.subscribe_phase();

    tokio::time::timeout(WAIT, phase.wait_for(|p| matches!(p, Phase::Authenticated(_))))
        .await
        .unwrap()
        .unwrap();
    assert!(!dashboard.gate().is_armed());
    assert!(dashboard.panels().detections.is_mounted());
    assert!(!dashboard.panels().security.is_mounted());
    assert_eq!(dashboard.session().current().unwrap().name, "Shami");

    dashboard.set_view(View::Demos);
    assert!(!dashboard.panels().detections.is_mounted());
    assert!(dashboard.panels().security.is_mounted());
    assert!(dashboard.panels().attendance.is_mounted());

    let mut health = dashboard.health().subscribe();
    tokio::time::timeout(WAIT, health.wait_for(|h| h.payload.is_some()))
        .await
        .unwrap()
        .unwrap();

    // From here on the recognizer falls below the threshold.
    server.reset().await;
    mount_backend(&server, 0.1).await;

    dashboard.logout();
    tokio::time::timeout(WAIT, phase.wait_for(|p| *p == Phase::Login))
        .await
        .unwrap()
        .unwrap();
    assert!(dashboard.gate().is_armed());
    assert!(!dashboard.panels().security.is_mounted());
    assert_eq!(dashboard.view(), View::Demos);

    let mut attempt = dashboard.gate().subscribe();
    let shown = tokio::time::timeout(WAIT, attempt.wait_for(|a| a.status == AuthStatus::NoMatch))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(shown.best_match.unwrap().name, "Shami");
    assert!(!dashboard.session().is_authenticated());

    dashboard.shutdown();
    assert!(!dashboard.gate().is_armed());
    assert!(!dashboard.health().is_mounted());
}

#[tokio::test]
async fn test_stream_reconnects_while_authenticated() {
    let (_server, dashboard) = start(0.8).await;
    let mut feed = dashboard.subscribe_feed();

    // The mock stream always fails, so the nonce keeps climbing.
    let state = tokio::time::timeout(
        WAIT,
        feed.wait_for(|f| f.session.is_some_and(|s| s.nonce >= 3)),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert!(state.url.unwrap().contains("/video-stream?t="));
    dashboard.shutdown();
}

#[tokio::test]
async fn test_no_panels_before_login() {
    let (_server, dashboard) = start(0.1).await;
    let mut attempt = dashboard.gate().subscribe();

    tokio::time::timeout(WAIT, attempt.wait_for(|a| a.status == AuthStatus::NoMatch))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dashboard.phase(), Phase::Login);
    assert!(!dashboard.panels().detections.is_mounted());
    assert!(dashboard.subscribe_feed().borrow().session.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_face_toggle_is_refused_after_logout() {
    let (_server, dashboard) = start(0.8).await;
    let mut phase = dashboard.subscribe_phase();

    tokio::time::timeout(WAIT, phase.wait_for(|p| matches!(p, Phase::Authenticated(_))))
        .await
        .unwrap()
        .unwrap();
    assert!(dashboard.set_face_enabled(true));
    assert!(dashboard.panels().face.last().is_mounted());

    dashboard.logout();
    // Refused as soon as the session is gone, before the supervisor catches up.
    assert!(!dashboard.set_face_enabled(true));

    tokio::time::timeout(WAIT, phase.wait_for(|p| *p == Phase::Login))
        .await
        .unwrap()
        .unwrap();
    assert!(!dashboard.set_face_enabled(true));
    assert!(!dashboard.panels().face.is_enabled());
    assert!(!dashboard.panels().face.last().is_mounted());
    dashboard.shutdown();
}
