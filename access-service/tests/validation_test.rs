//! End-to-end credential validation: PIN and NFC flows, UID normalization,
//! the global kill switch, and the append-only audit trail.

mod common;

use access_service::PRIMARY_DEVICE_ID;
use common::{assert_no_frame, next_frame, TestApp};

async fn seed_pin(app: &TestApp, user_id: i64, pin: &str) {
    app.state
        .db
        .create_access_pin(user_id, pin, true)
        .await
        .expect("Failed to seed PIN");
}

async fn seed_card(app: &TestApp, user_id: i64, uid: &str) {
    app.state
        .db
        .create_nfc_card(uid, user_id, "Main card", true)
        .await
        .expect("Failed to seed card");
}

#[tokio::test]
async fn valid_pin_grants_access_logs_and_notifies_device() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Ana", "ana", "Sup3rSecret").await;
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", true).await;
    seed_pin(&app, user_id, "123456").await;
    let mut rx = app.register_device_handle(PRIMARY_DEVICE_ID);

    let logs_before = app.log_count().await;

    let response = app
        .client
        .post(format!("{}/access-pins/validate", app.address))
        .json(&serde_json::json!({ "pin_code": "123456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["name"], "Ana");

    // Exactly one new audit entry, tagged as a PIN event.
    assert_eq!(app.log_count().await, logs_before + 1);
    let access_type: String =
        sqlx::query_scalar("SELECT access_type FROM logs ORDER BY id DESC LIMIT 1")
            .fetch_one(app.state.db.pool())
            .await
            .unwrap();
    assert_eq!(access_type, "pin");

    // Device channel received the access notification.
    let frame = next_frame(&mut rx).await;
    let msg: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(msg["type"], "pin_access");
    assert_eq!(msg["valid"], true);
    assert_eq!(msg["user_name"], "Ana");
}

#[tokio::test]
async fn wrong_pin_is_rejected_without_side_effects() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Ana", "ana", "Sup3rSecret").await;
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", true).await;
    seed_pin(&app, user_id, "123456").await;
    let mut rx = app.register_device_handle(PRIMARY_DEVICE_ID);

    let logs_before = app.log_count().await;

    let response = app
        .client
        .post(format!("{}/access-pins/validate", app.address))
        .json(&serde_json::json!({ "pin_code": "654321" }))
        .send()
        .await
        .unwrap();
    // A rejected credential is a normal outcome, not an HTTP error.
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);

    assert_eq!(app.log_count().await, logs_before);
    assert_no_frame(&mut rx).await;
}

#[tokio::test]
async fn uid_normalization_resolves_all_equivalent_forms() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Ana", "ana", "Sup3rSecret").await;
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", true).await;
    seed_card(&app, user_id, "AA 11 BB 22").await;

    for input in ["AA11BB22", "AA 11 BB 22", "aa11bb22"] {
        let response = app
            .client
            .post(format!("{}/nfc-cards/validate", app.address))
            .json(&serde_json::json!({ "card_uid": input }))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["valid"], true, "input {input:?} should validate");
        assert_eq!(body["card"]["card_uid"], "AA 11 BB 22");
    }
}

#[tokio::test]
async fn unknown_uid_is_rejected() {
    let app = TestApp::spawn().await;
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", true).await;

    let response = app
        .client
        .post(format!("{}/nfc-cards/validate", app.address))
        .json(&serde_json::json!({ "card_uid": "DE AD BE EF" }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Card not recognized or disabled");
}

#[tokio::test]
async fn disabled_card_never_validates() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Ana", "ana", "Sup3rSecret").await;
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", true).await;
    let card = app
        .state
        .db
        .create_nfc_card("AA 11 BB 22", user_id, "Main card", false)
        .await
        .unwrap();
    assert!(!card.status);

    let response = app
        .client
        .post(format!("{}/nfc-cards/validate", app.address))
        .json(&serde_json::json!({ "card_uid": "AA11BB22" }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn disabled_user_is_rejected_even_with_valid_card() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Ana", "ana", "Sup3rSecret").await;
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", true).await;
    seed_card(&app, user_id, "AA 11 BB 22").await;
    app.state
        .db
        .update_user(user_id, None, None, None, Some(false))
        .await
        .unwrap();

    let response = app
        .client
        .post(format!("{}/nfc-cards/validate", app.address))
        .json(&serde_json::json!({ "card_uid": "AA11BB22" }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "User disabled");
}

#[tokio::test]
async fn kill_switch_blocks_both_flows() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Ana", "ana", "Sup3rSecret").await;
    // Primary device with the reader switched off.
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", false).await;
    seed_card(&app, user_id, "AA 11 BB 22").await;
    seed_pin(&app, user_id, "123456").await;

    let logs_before = app.log_count().await;

    let response = app
        .client
        .post(format!("{}/nfc-cards/validate", app.address))
        .json(&serde_json::json!({ "card_uid": "AA11BB22" }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "NFC reader disabled - system out of service");

    let response = app
        .client
        .post(format!("{}/access-pins/validate", app.address))
        .json(&serde_json::json!({ "pin_code": "123456" }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "System disabled - emergency mode");

    // Rejections leave no trace in the audit trail.
    assert_eq!(app.log_count().await, logs_before);
}

#[tokio::test]
async fn verify_pin_checks_only_the_callers_pin() {
    let app = TestApp::spawn().await;
    let ana = app.seed_user("Ana", "ana", "Sup3rSecret").await;
    let bob = app.seed_user("Bob", "bob", "Sup3rSecret").await;
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", true).await;
    seed_pin(&app, ana, "123456").await;
    seed_pin(&app, bob, "999999").await;

    let token = app.login("ana", "Sup3rSecret").await;

    // Own PIN verifies.
    let response = app
        .client
        .post(format!("{}/access-pins/verify", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "pin_code": "123456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Another user's valid PIN does not.
    let response = app
        .client
        .post(format!("{}/access-pins/verify", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "pin_code": "999999" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn second_active_pin_for_same_user_is_refused() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("Ana", "ana", "Sup3rSecret").await;
    app.seed_device(PRIMARY_DEVICE_ID, "entrance", true).await;
    seed_pin(&app, user_id, "123456").await;

    let token = app.login("ana", "Sup3rSecret").await;

    let response = app
        .client
        .post(format!("{}/access-pins", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "id_user": user_id, "pin_code": "222222" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
