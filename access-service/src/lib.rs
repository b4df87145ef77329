pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod utils;
pub mod ws;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AccessConfig;
use crate::error::AppError;
use crate::services::{ConnectionRegistry, Database, JwtService, WhatsAppNotifier};

/// Well-known id of the primary access-control unit. Its `nfc_reader_active`
/// flag is the global kill switch and it is the default notification target.
pub const PRIMARY_DEVICE_ID: i64 = 1;

#[derive(Clone)]
pub struct AppState {
    pub config: AccessConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub registry: Arc<ConnectionRegistry>,
    pub whatsapp: WhatsAppNotifier,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Everything behind a session token: entity CRUD and account management.
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/verify", get(handlers::auth::verify))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/api/auth/change-password",
            post(handlers::auth::change_password),
        )
        .route("/users", get(handlers::users::list_users))
        .route(
            "/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/devices",
            get(handlers::devices::list_devices).post(handlers::devices::create_device),
        )
        .route(
            "/devices/:id",
            get(handlers::devices::get_device)
                .put(handlers::devices::update_device)
                .delete(handlers::devices::delete_device),
        )
        .route("/logs", get(handlers::logs::list_logs))
        .route(
            "/nfc-cards",
            get(handlers::nfc_cards::list_cards).post(handlers::nfc_cards::create_card),
        )
        .route(
            "/nfc-cards/register-card",
            post(handlers::nfc_cards::register_card),
        )
        .route(
            "/nfc-cards/:id",
            get(handlers::nfc_cards::get_card)
                .put(handlers::nfc_cards::update_card)
                .delete(handlers::nfc_cards::delete_card),
        )
        .route(
            "/access-pins",
            get(handlers::access_pins::list_pins).post(handlers::access_pins::create_pin),
        )
        .route("/access-pins/verify", post(handlers::access_pins::verify_pin))
        .route(
            "/access-pins/:id",
            get(handlers::access_pins::get_pin)
                .put(handlers::access_pins::update_pin)
                .delete(handlers::access_pins::delete_pin),
        )
        .route(
            "/actions",
            get(handlers::actions::list_actions).post(handlers::actions::create_action),
        )
        .route(
            "/actions/:id",
            get(handlers::actions::get_action)
                .put(handlers::actions::update_action_status)
                .delete(handlers::actions::delete_action),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        // Credential validation is called by the reader hardware itself.
        .route("/nfc-cards/validate", post(handlers::nfc_cards::validate_card))
        .route("/access-pins/validate", post(handlers::access_pins::validate_pin))
        // Device-facing endpoints; the embedded unit holds no session token.
        .route(
            "/actions/device/confirm/:action_id",
            post(handlers::actions::confirm_action_execution),
        )
        .route("/actions/access-log", post(handlers::actions::device_access_log))
        .route("/ws/device/:device_id", get(ws::device_channel))
        .route("/ws/client", get(ws::client_channel))
        .merge(protected_routes)
        .with_state(state.clone())
        .layer(from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allow_origin(&state.config.security.allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        );

    Ok(app)
}

/// A configured `*` opens the check to any origin; `AllowOrigin::list` does
/// not accept wildcard entries, so that case never reaches the list path.
/// Entries that do not parse as header values are skipped.
fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        return AllowOrigin::any();
    }

    AllowOrigin::list(origins.iter().filter_map(|o| {
        match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Skipping invalid CORS origin '{}': {}", o, e);
                None
            }
        }
    }))
}

/// Service health check
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        e
    })?;

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up"
        },
        "connections": {
            "devices": state.registry.device_count(),
            "clients": state.registry.client_count()
        }
    })))
}
