//! Request metrics: counters, bucketed series, Prometheus scrape and the
//! HTTP metrics middleware

pub mod dto;
pub mod handlers;
pub mod middleware;

pub use dto::*;
pub use handlers::*;
pub use middleware::http_metrics_middleware;
