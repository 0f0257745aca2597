//! Metrics handlers
//!
//! `GET /metrics` reads the in-process counters, `GET /metrics/buckets`
//! serves the durable bucketed series and `GET /prometheus` renders the
//! `metrics-exporter-prometheus` recorder.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Duration;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::warn;

use super::dto::{BucketPoint, BucketQuery, BucketSeries};
use crate::application::{BucketAggregator, CounterSnapshot, RequestCounters};
use crate::config::MetricsConfig;
use crate::domain::GatewayError;
use crate::infrastructure::RequestLog;
use crate::interfaces::http::middleware::AuthenticatedUser;

/// Shared state for the metrics endpoints
#[derive(Clone)]
pub struct MetricsState {
    pub counters: Arc<RequestCounters>,
    pub aggregator: BucketAggregator,
    pub request_log: Arc<RequestLog>,
    pub settings: MetricsConfig,
}

/// Shared state for the Prometheus scrape endpoint
#[derive(Clone)]
pub struct PrometheusState {
    pub handle: PrometheusHandle,
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Metrics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Counters; request_count_in_interval resets on read", body = CounterSnapshot),
        (status = 403, description = "Role lacks the metrics permission")
    )
)]
pub async fn get_metrics(
    State(state): State<MetricsState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<CounterSnapshot> {
    let snapshot = state.counters.read_and_reset();

    let line = format!(
        "Metrics read by {}: total={}, interval={}, errors={}",
        user.username(),
        snapshot.total_request_count,
        snapshot.request_count_in_interval,
        snapshot.error_count
    );
    if let Err(e) = state.request_log.append_metrics(&line).await {
        warn!(error = %e, "Metrics log write lost");
    }

    Json(snapshot)
}

#[utoipa::path(
    get,
    path = "/metrics/buckets",
    tag = "Metrics",
    params(BucketQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Gap-filled series, oldest first", body = BucketSeries),
        (status = 400, description = "count or width out of range"),
        (status = 403, description = "Role lacks the metrics permission")
    )
)]
pub async fn get_bucket_series(
    State(state): State<MetricsState>,
    Query(query): Query<BucketQuery>,
) -> Result<Json<BucketSeries>, GatewayError> {
    let count = query.count.unwrap_or(state.settings.default_bucket_count);
    if count > state.settings.max_bucket_count {
        return Err(GatewayError::InvalidRequest(format!(
            "count must be at most {}",
            state.settings.max_bucket_count
        )));
    }

    let width_secs = query.width.unwrap_or(state.settings.bucket_width_secs);
    if width_secs <= 0 || width_secs > state.settings.max_bucket_width_secs {
        return Err(GatewayError::InvalidRequest(format!(
            "width must be between 1 and {} seconds",
            state.settings.max_bucket_width_secs
        )));
    }
    let width = Duration::try_seconds(width_secs)
        .ok_or_else(|| GatewayError::InvalidRequest("width out of range".to_string()))?;

    let buckets = state.aggregator.recent_buckets(count, width).await?;

    Ok(Json(BucketSeries {
        width_secs,
        buckets: buckets.into_iter().map(BucketPoint::from).collect(),
    }))
}

/// `GET /prometheus`: Prometheus scrape endpoint (no auth)
#[utoipa::path(
    get,
    path = "/prometheus",
    tag = "Metrics",
    responses((status = 200, description = "Prometheus text exposition", body = String))
)]
pub async fn prometheus_metrics(State(state): State<PrometheusState>) -> impl IntoResponse {
    let body = state.handle.render();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
