use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use crate::services::metrics;

pub async fn get_metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::get_metrics(),
    )
}
