use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static DEVICE_CONNECTIONS: OnceLock<IntGauge> = OnceLock::new();
pub static CLIENT_CONNECTIONS: OnceLock<IntGauge> = OnceLock::new();

pub fn init_metrics() {
    let registry = Registry::new();

    let requests_total = match IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    ) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!("Failed to create http_requests_total metric: {}", e);
            panic!("Failed to initialize metrics: {}", e);
        }
    };

    let request_duration = match HistogramVec::new(
        prometheus::HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    ) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!(
                "Failed to create http_request_duration_seconds metric: {}",
                e
            );
            panic!("Failed to initialize metrics: {}", e);
        }
    };

    let device_connections = match IntGauge::new(
        "device_connections",
        "Number of device channels currently registered",
    ) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!("Failed to create device_connections metric: {}", e);
            panic!("Failed to initialize metrics: {}", e);
        }
    };

    let client_connections = match IntGauge::new(
        "client_connections",
        "Number of anonymous dashboard channels currently registered",
    ) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!("Failed to create client_connections metric: {}", e);
            panic!("Failed to initialize metrics: {}", e);
        }
    };

    for collector in [
        Box::new(requests_total.clone()) as Box<dyn prometheus::core::Collector>,
        Box::new(request_duration.clone()),
        Box::new(device_connections.clone()),
        Box::new(client_connections.clone()),
    ] {
        if let Err(e) = registry.register(collector) {
            tracing::error!("Failed to register metrics collector: {}", e);
            panic!("Failed to initialize metrics: {}", e);
        }
    }

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = DEVICE_CONNECTIONS.set(device_connections);
    let _ = CLIENT_CONNECTIONS.set(client_connections);
}

pub fn observe_request(method: &str, path: &str, status: &str, duration_seconds: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, path, status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path, status])
            .observe(duration_seconds);
    }
}

/// Registry size gauges; no-op until `init_metrics` has run (unit tests).
pub fn set_connection_gauges(devices: i64, clients: i64) {
    if let Some(gauge) = DEVICE_CONNECTIONS.get() {
        gauge.set(devices);
    }
    if let Some(gauge) = CLIENT_CONNECTIONS.get() {
        gauge.set(clients);
    }
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::error!("Metrics output is not valid UTF-8: {}", e);
            format!("# Metrics output is not valid UTF-8: {}\n", e)
        }
    }
}
