//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    BucketAggregator, CounterSnapshot, DashboardPoller, InferenceFacade, RequestCounters,
    TokenService,
};
use crate::config::MetricsConfig;
use crate::domain::{Label, Operation, Role};
use crate::infrastructure::RequestLog;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::{auth_middleware, require_permission, AuthState};
use crate::interfaces::http::modules::{
    auth, dashboard, health, logs, metrics, predict, request_id::request_id_middleware,
};

/// Everything the HTTP surface needs. Handlers extract their own slice via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub inference: Arc<InferenceFacade>,
    pub counters: Arc<RequestCounters>,
    pub aggregator: BucketAggregator,
    pub request_log: Arc<RequestLog>,
    pub poller: Option<Arc<DashboardPoller>>,
    pub metrics_settings: MetricsConfig,
    pub prometheus: PrometheusHandle,
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        AuthState {
            tokens: Arc::clone(&s.tokens),
        }
    }
}

impl FromRef<AppState> for auth::AuthHandlerState {
    fn from_ref(s: &AppState) -> Self {
        auth::AuthHandlerState {
            tokens: Arc::clone(&s.tokens),
        }
    }
}

impl FromRef<AppState> for predict::PredictState {
    fn from_ref(s: &AppState) -> Self {
        predict::PredictState {
            inference: Arc::clone(&s.inference),
        }
    }
}

impl FromRef<AppState> for metrics::MetricsState {
    fn from_ref(s: &AppState) -> Self {
        metrics::MetricsState {
            counters: Arc::clone(&s.counters),
            aggregator: s.aggregator.clone(),
            request_log: Arc::clone(&s.request_log),
            settings: s.metrics_settings.clone(),
        }
    }
}

impl FromRef<AppState> for metrics::PrometheusState {
    fn from_ref(s: &AppState) -> Self {
        metrics::PrometheusState {
            handle: s.prometheus.clone(),
        }
    }
}

impl FromRef<AppState> for logs::LogsState {
    fn from_ref(s: &AppState) -> Self {
        logs::LogsState {
            request_log: Arc::clone(&s.request_log),
        }
    }
}

impl FromRef<AppState> for dashboard::DashboardState {
    fn from_ref(s: &AppState) -> Self {
        dashboard::DashboardState {
            poller: s.poller.clone(),
        }
    }
}

impl FromRef<AppState> for health::HealthState {
    fn from_ref(s: &AppState) -> Self {
        health::HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /login"))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Basic)
                        .description(Some("Username and password, login only"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::get_current_user,
        predict::predict,
        metrics::get_metrics,
        metrics::get_bucket_series,
        metrics::prometheus_metrics,
        dashboard::get_dashboard_series,
        logs::get_logs,
        logs::clear_logs,
    ),
    components(
        schemas(
            ApiResponse<String>,
            Role,
            Operation,
            Label,
            CounterSnapshot,
            health::HealthResponse,
            health::ComponentHealth,
            auth::LoginResponse,
            auth::CurrentUser,
            predict::PredictRequest,
            predict::PredictResponse,
            metrics::BucketPoint,
            metrics::BucketSeries,
            dashboard::DashboardSeries,
            dashboard::CounterSampleDto,
            logs::LogsResponse,
            logs::ClearedLogs,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service and event store health"),
        (name = "Authentication", description = "Basic-auth login issuing short-lived bearer tokens"),
        (name = "Inference", description = "Spam / human text classification"),
        (name = "Metrics", description = "Request counters, bucketed series and Prometheus scrape"),
        (name = "Logs", description = "Request log access"),
    ),
    info(
        title = "Spam Gateway API",
        version = "1.0.0",
        description = "Role-gated spam classification with bucketed request metrics",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Routes gated by `operation`, behind token authentication
fn gated(state: &AppState, operation: Operation, routes: Router<AppState>) -> Router<AppState> {
    routes
        .route_layer(middleware::from_fn_with_state(operation, require_permission))
        .route_layer(middleware::from_fn_with_state(
            AuthState::from_ref(state),
            auth_middleware,
        ))
}

/// Create the API router with all routes
pub fn create_api_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/health", get(health::health_check))
        .route("/prometheus", get(metrics::prometheus_metrics));

    let authenticated_routes = Router::new()
        .route("/me", get(auth::get_current_user))
        .route_layer(middleware::from_fn_with_state(
            AuthState::from_ref(&state),
            auth_middleware,
        ));

    let predict_routes = gated(
        &state,
        Operation::Predict,
        Router::new().route("/predict", post(predict::predict)),
    );

    let metrics_routes = gated(
        &state,
        Operation::Metrics,
        Router::new()
            .route("/metrics", get(metrics::get_metrics))
            .route("/metrics/buckets", get(metrics::get_bucket_series))
            .route("/dashboard/series", get(dashboard::get_dashboard_series)),
    );

    let logs_routes = gated(
        &state,
        Operation::Logs,
        Router::new()
            .route("/logs", get(logs::get_logs))
            .route("/clear_logs", delete(logs::clear_logs)),
    );

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(predict_routes)
        .merge(metrics_routes)
        .merge(logs_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
