//! Shared harness for integration tests: a real service instance bound to an
//! ephemeral port, backed by an in-memory SQLite database.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::mpsc::UnboundedReceiver;

use access_service::config::{
    AccessConfig, DatabaseConfig, Environment, JwtConfig, SecurityConfig, WhatsAppConfig,
};
use access_service::services::registry::{ChannelHandle, OutboundFrame};
use access_service::services::{ConnectionRegistry, Database, JwtService, WhatsAppNotifier};
use access_service::utils::{hash_password, Password};
use access_service::{build_router, AppState};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> TestApp {
        Self::spawn_with_origins(vec!["http://localhost".to_string()]).await
    }

    /// Spawn with an explicit CORS origin list, for tests exercising the
    /// browser-facing layer.
    pub async fn spawn_with_origins(allowed_origins: Vec<String>) -> TestApp {
        let config = AccessConfig {
            environment: Environment::Dev,
            service_name: "access-service".to_string(),
            service_version: "test".to_string(),
            log_level: "warn".to_string(),
            port: 0,
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "integration-test-secret-0123456789".to_string(),
                access_token_expiry_minutes: 30,
            },
            whatsapp: WhatsAppConfig {
                api_key: None,
                admin_phone: None,
            },
            security: SecurityConfig { allowed_origins },
        };

        // A single connection keeps the in-memory database alive and shared.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&config.database.url)
            .await
            .expect("Failed to open in-memory database");
        let db = Database::from_pool(pool);
        db.run_migrations().await.expect("Failed to run migrations");

        let state = AppState {
            jwt: JwtService::new(&config.jwt).expect("Failed to build JWT service"),
            whatsapp: WhatsAppNotifier::new(&config.whatsapp),
            registry: Arc::new(ConnectionRegistry::new()),
            db,
            config,
        };

        let app = build_router(state.clone())
            .await
            .expect("Failed to build router");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server crashed");
        });

        TestApp {
            address,
            client: reqwest::Client::new(),
            state,
        }
    }

    /// Insert a user directly and return its id.
    pub async fn seed_user(&self, name: &str, username: &str, password: &str) -> i64 {
        let hash = hash_password(&Password::new(password.to_string())).unwrap();
        let user = self
            .state
            .db
            .create_user(name, username, hash.as_str(), &format!("{username}@example.com"), true)
            .await
            .expect("Failed to seed user");
        user.id
    }

    /// Insert a device row with an explicit id so tests can control the
    /// primary device record.
    pub async fn seed_device(&self, id: i64, name: &str, nfc_reader_active: bool) {
        sqlx::query(
            r#"
            INSERT INTO devices (id, name, status, nfc_reader_active, emergency_mode, created_at, updated_at)
            VALUES (?, ?, 'online', ?, FALSE, ?, ?)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(nfc_reader_active)
        .bind(chrono::Utc::now())
        .bind(chrono::Utc::now())
        .execute(self.state.db.pool())
        .await
        .expect("Failed to seed device");
    }

    /// Log in over HTTP and return the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.address))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login request failed");
        assert!(response.status().is_success(), "login failed");
        let body: serde_json::Value = response.json().await.unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Register a channel handle for a device identity, bypassing the
    /// websocket transport; the returned receiver observes outbound frames.
    pub fn register_device_handle(&self, device_id: i64) -> UnboundedReceiver<OutboundFrame> {
        let (handle, rx) = ChannelHandle::new();
        self.state.registry.connect(handle, Some(device_id));
        rx
    }

    /// Register an anonymous dashboard channel.
    pub fn connect_client_handle(&self) -> UnboundedReceiver<OutboundFrame> {
        let (handle, rx) = ChannelHandle::new();
        self.state.registry.connect(handle, None);
        rx
    }

    pub async fn log_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM logs")
            .fetch_one(self.state.db.pool())
            .await
            .expect("Failed to count logs")
    }
}

/// Drain the next text frame from a channel receiver, with a timeout so a
/// missing frame fails the test instead of hanging it.
pub async fn next_frame(rx: &mut UnboundedReceiver<OutboundFrame>) -> String {
    let frame = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .expect("Timed out waiting for channel frame")
        .expect("Channel closed");
    match frame {
        OutboundFrame::Message(text) => text,
        OutboundFrame::Close => panic!("Unexpected close frame"),
    }
}

/// Assert that no frame arrives within a short window.
pub async fn assert_no_frame(rx: &mut UnboundedReceiver<OutboundFrame>) {
    let result =
        tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await;
    assert!(result.is_err(), "Expected no frame, got {:?}", result);
}
