//! Session lifecycle: register, login, verify, refresh, logout, and the
//! server-side token mirror that makes revocation immediate.

mod common;

use common::TestApp;

#[tokio::test]
async fn register_then_login_and_verify() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({
            "name": "Ana",
            "username": "ana",
            "password": "Sup3rSecret",
            "email": "ana@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "ana");
    assert!(body.get("password").is_none(), "password must never leak");

    let token = app.login("ana", "Sup3rSecret").await;

    let response = app
        .client
        .get(format!("{}/api/auth/verify", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["username"], "ana");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let app = TestApp::spawn().await;
    app.seed_user("Ana", "ana", "Sup3rSecret").await;

    let response = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({
            "name": "Imposter",
            "username": "ana",
            "password": "An0therSecret",
            "email": "other@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn weak_password_is_refused_at_registration() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({
            "name": "Ana",
            "username": "ana",
            "password": "alllowercase",
            "email": "ana@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn invalid_registration_fields_are_unprocessable() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({
            "name": "Ana",
            "username": "an",
            "password": "Sup3rSecret",
            "email": "not-an-email"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation error");
    assert!(body["details"].as_str().is_some());
}

#[tokio::test]
async fn malformed_json_body_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.seed_user("Ana", "ana", "Sup3rSecret").await;

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "username": "ana", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = TestApp::spawn().await;
    app.seed_user("Ana", "ana", "Sup3rSecret").await;
    let token = app.login("ana", "Sup3rSecret").await;

    let response = app
        .client
        .post(format!("{}/api/auth/logout", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The signature is still valid, but the mirror row is gone.
    let response = app
        .client
        .get(format!("{}/api/auth/verify", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn refresh_rotates_the_token() {
    let app = TestApp::spawn().await;
    app.seed_user("Ana", "ana", "Sup3rSecret").await;
    let token = app.login("ana", "Sup3rSecret").await;

    let response = app
        .client
        .post(format!("{}/api/auth/refresh", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let new_token = body["access_token"].as_str().unwrap().to_string();

    // Old token is dead, new one works.
    let response = app
        .client
        .get(format!("{}/api/auth/verify", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .get(format!("{}/api/auth/verify", app.address))
        .bearer_auth(&new_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn change_password_ends_every_session() {
    let app = TestApp::spawn().await;
    app.seed_user("Ana", "ana", "Sup3rSecret").await;
    let session_a = app.login("ana", "Sup3rSecret").await;
    let session_b = app.login("ana", "Sup3rSecret").await;

    let response = app
        .client
        .post(format!("{}/api/auth/change-password", app.address))
        .bearer_auth(&session_a)
        .json(&serde_json::json!({
            "current_password": "Sup3rSecret",
            "new_password": "N3wSecretValue"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    for token in [&session_a, &session_b] {
        let response = app
            .client
            .get(format!("{}/api/auth/verify", app.address))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    // And the new password logs in.
    app.login("ana", "N3wSecretValue").await;
}

#[tokio::test]
async fn protected_route_requires_a_token() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/users", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
