//! The browser-facing layers: CORS origin handling and request-id
//! propagation.

mod common;

use common::TestApp;

#[tokio::test]
async fn wildcard_origin_config_still_serves() {
    // A `*` entry must open the origin check, not break router construction.
    let app = TestApp::spawn_with_origins(vec!["*".to_string()]).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("origin", "http://dashboard.example")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn listed_origin_is_allowed_and_others_are_not() {
    let app =
        TestApp::spawn_with_origins(vec!["http://dashboard.example".to_string()]).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("origin", "http://dashboard.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://dashboard.example")
    );

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("origin", "http://elsewhere.example")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn unparseable_origin_entries_are_skipped() {
    let app = TestApp::spawn_with_origins(vec![
        "not a header value".to_string(),
        "http://dashboard.example".to_string(),
    ])
    .await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("origin", "http://dashboard.example")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://dashboard.example")
    );
}

#[tokio::test]
async fn request_id_is_echoed_when_supplied() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-42")
    );
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("response must carry a request id");
    assert!(!request_id.is_empty());
}
