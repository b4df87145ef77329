pub mod auth;
pub mod metrics;
pub mod tracing;

pub use auth::{auth_middleware, CurrentUser};
pub use metrics::metrics_middleware;
pub use tracing::request_id_middleware;
