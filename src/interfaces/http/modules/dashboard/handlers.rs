use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};

use super::dto::DashboardSeries;
use crate::application::DashboardPoller;
use crate::interfaces::http::common::ApiResponse;

#[derive(Clone)]
pub struct DashboardState {
    /// `None` when the poller is disabled in configuration
    pub poller: Option<Arc<DashboardPoller>>,
}

#[utoipa::path(
    get,
    path = "/dashboard/series",
    tag = "Metrics",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Most recent poll", body = DashboardSeries),
        (status = 403, description = "Role lacks the metrics permission"),
        (status = 503, description = "Dashboard poller disabled")
    )
)]
pub async fn get_dashboard_series(State(state): State<DashboardState>) -> Response {
    let Some(poller) = state.poller else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::error("Dashboard poller is disabled")),
        )
            .into_response();
    };

    let width_secs = poller.config().bucket_width.num_seconds();
    let snapshot = poller.latest().await;
    Json(DashboardSeries::from_snapshot(snapshot, width_secs)).into_response()
}
