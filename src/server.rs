//! Gateway runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: metrics recorder, event store
//! and migrations, credential store, inference backend, dashboard poller,
//! the HTTP API and graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration as StdDuration, Instant};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::{
    BucketAggregator, DashboardPoller, EventRecorder, InferenceFacade, PollerConfig,
    RequestCounters, TokenService,
};
use crate::config::{AppConfig, LogFormat};
use crate::domain::EventRepository;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{
    build_classifier, init_database, DatabaseConfig, InMemoryCredentialStore, RequestLog,
    SeaOrmEventRepository, ShutdownCoordinator, ShutdownSignal,
};
use crate::interfaces::http::{create_api_router, AppState};

/// Options for starting the gateway.
pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Install OS signal listeners (default: true).
    pub handle_signals: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            handle_signals: true,
        }
    }
}

impl From<AppConfig> for ServerOptions {
    fn from(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

/// Handle to a running gateway.
pub struct ServerHandle {
    /// Address the HTTP API is bound to.
    pub local_addr: SocketAddr,
    /// The configuration the server was started with.
    pub config: AppConfig,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
    poller_task: Option<tokio::task::JoinHandle<()>>,
}

/// The global recorder can only be installed once per process; restarts reuse it.
fn prometheus_handle() -> PrometheusHandle {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("📊 Prometheus metrics recorder installed");
                handle
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}; /prometheus will be empty", e);
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

impl ServerHandle {
    /// Start the gateway.
    ///
    /// Fails if the configuration does not validate, the event store cannot
    /// be opened, a configured user is invalid, the inference backend cannot
    /// be built or the listen address cannot be bound.
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        opts.config.validate()?;
        let app_cfg = opts.config;

        info!("Starting Spam Gateway...");

        let prometheus = prometheus_handle();

        // ── Event store ────────────────────────────────────────
        let db_config = DatabaseConfig {
            url: app_cfg.database.connection_url(),
        };
        let db = init_database(&db_config).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        let repository: Arc<dyn EventRepository> =
            Arc::new(SeaOrmEventRepository::new(db.clone()));
        let recorder = EventRecorder::new(Arc::clone(&repository));

        // ── Credentials & tokens ───────────────────────────────
        let users = app_cfg.users.clone();
        let cost = app_cfg.security.bcrypt_cost;
        let credentials =
            tokio::task::spawn_blocking(move || InMemoryCredentialStore::from_entries(&users, cost))
                .await??;
        info!("🔐 {} user(s) loaded", credentials.len());

        if app_cfg.security.jwt_secret.is_empty() {
            warn!("No jwt_secret configured; tokens will not survive a restart");
        }
        let jwt_config = JwtConfig::new(
            &app_cfg.security.jwt_secret,
            app_cfg.security.token_ttl_minutes,
        );
        info!(
            "JWT configured with {}min token expiration",
            jwt_config.expiration_minutes
        );
        let tokens = Arc::new(TokenService::new(
            Arc::new(credentials),
            recorder.clone(),
            jwt_config,
        ));

        // ── Inference ──────────────────────────────────────────
        let classifier = build_classifier(&app_cfg.inference)?;
        info!("🧠 Inference backend: {:?}", app_cfg.inference.backend);

        let counters = Arc::new(RequestCounters::new());
        let request_log = Arc::new(RequestLog::new(
            &app_cfg.logging.request_log_path,
            &app_cfg.logging.metrics_log_path,
        ));
        let inference = Arc::new(InferenceFacade::new(
            classifier,
            recorder,
            Arc::clone(&counters),
            Arc::clone(&request_log),
        ));
        let aggregator = BucketAggregator::new(repository);

        // ── Shutdown & background tasks ────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();
        if opts.handle_signals {
            shutdown.start_signal_listener();
        }

        let (poller, poller_task) = if app_cfg.dashboard.enabled {
            let poller = Arc::new(DashboardPoller::new(
                aggregator.clone(),
                Arc::clone(&counters),
                PollerConfig {
                    interval: StdDuration::from_secs(app_cfg.dashboard.poll_interval_secs),
                    bucket_count: app_cfg.dashboard.bucket_count,
                    bucket_width: chrono::Duration::seconds(app_cfg.metrics.bucket_width_secs),
                    history_len: app_cfg.dashboard.history_len,
                },
            ));
            let task = Arc::clone(&poller).start(shutdown_signal.clone());
            (Some(poller), Some(task))
        } else {
            (None, None)
        };

        // ── HTTP API ───────────────────────────────────────────
        let state = AppState {
            tokens,
            inference,
            counters,
            aggregator,
            request_log,
            poller,
            metrics_settings: app_cfg.metrics.clone(),
            prometheus,
            db: db.clone(),
            started_at: Arc::new(Instant::now()),
        };
        let api_router = create_api_router(state);

        let listener = tokio::net::TcpListener::bind(app_cfg.listen_address()).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal;
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 HTTP API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("HTTP API server error: {}", e);
            }
        });

        info!("🚀 Spam Gateway started");

        Ok(Self {
            local_addr,
            config: app_cfg,
            db,
            shutdown,
            api_task,
            poller_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait until shutdown is triggered, then for in-flight work to finish
    /// within the configured timeout.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            poller_task,
            ..
        } = self;

        shutdown.signal().wait().await;
        info!("⏳ Waiting for server tasks to complete...");

        let completed = shutdown
            .drain(async move {
                match api_task.await {
                    Ok(()) => info!("HTTP API stopped"),
                    Err(e) => error!("HTTP API task panicked: {}", e),
                }
                if let Some(task) = poller_task {
                    if let Err(e) = task.await {
                        error!("Dashboard poller task panicked: {}", e);
                    }
                }
            })
            .await;
        if !completed {
            warn!("Some requests were still in flight at shutdown");
        }

        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 Spam Gateway shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down Spam Gateway...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the HTTP API is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the logging section.
///
/// `RUST_LOG` overrides the configured level. Call once, before
/// [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("Tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::config::UserEntry;

    fn temp_config() -> (AppConfig, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("spam-gateway-server-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut cfg = AppConfig::default();
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 0;
        cfg.server.shutdown_timeout = 5;
        cfg.database.path = dir.join("events.db").display().to_string();
        cfg.logging.request_log_path = dir.join("app.log").display().to_string();
        cfg.logging.metrics_log_path = dir.join("metrics.log").display().to_string();
        cfg.security.jwt_secret = "server-test-secret".to_string();
        cfg.security.bcrypt_cost = 4;
        cfg.users = vec![UserEntry::plain("admin", "adminpass", Role::Admin)];
        (cfg, dir)
    }

    #[tokio::test]
    async fn starts_serves_and_shuts_down() {
        let (cfg, dir) = temp_config();
        let handle = ServerHandle::start(ServerOptions {
            config: cfg,
            auto_migrate: true,
            handle_signals: false,
        })
        .await
        .unwrap();
        assert!(handle.is_running());

        let url = format!("http://{}/health", handle.local_addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);

        let login = reqwest::Client::new()
            .post(format!("http://{}/login", handle.local_addr))
            .basic_auth("admin", Some("adminpass"))
            .send()
            .await
            .unwrap();
        assert_eq!(login.status().as_u16(), 200);

        handle.shutdown().await;
        let _ = std::fs::remove_dir_all(dir);
    }

    fn options(config: AppConfig) -> ServerOptions {
        ServerOptions {
            config,
            auto_migrate: true,
            handle_signals: false,
        }
    }

    async fn admin_token(client: &reqwest::Client, addr: SocketAddr) -> String {
        let body: serde_json::Value = client
            .post(format!("http://{}/login", addr))
            .basic_auth("admin", Some("adminpass"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn zero_poll_interval_fails_startup() {
        let (mut cfg, dir) = temp_config();
        cfg.dashboard.poll_interval_secs = 0;

        let result = ServerHandle::start(options(cfg)).await;
        assert!(result.is_err());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn recorded_events_survive_restart() {
        let (cfg, dir) = temp_config();
        let client = reqwest::Client::new();

        let first = ServerHandle::start(options(cfg.clone())).await.unwrap();
        let token = admin_token(&client, first.local_addr).await;
        let resp = client
            .post(format!("http://{}/predict", first.local_addr))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "text": "buy now!!!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        first.shutdown().await;

        let second = ServerHandle::start(options(cfg)).await.unwrap();
        let token = admin_token(&client, second.local_addr).await;
        let series: serde_json::Value = client
            .get(format!("http://{}/metrics/buckets", second.local_addr))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let total: u64 = series["buckets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["total"].as_u64().unwrap())
            .sum();
        assert_eq!(total, 1);

        second.shutdown().await;
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn invalid_user_entry_fails_startup() {
        let (mut cfg, dir) = temp_config();
        cfg.users = vec![UserEntry {
            username: "broken".to_string(),
            password: None,
            password_hash: Some("not-a-hash".to_string()),
            role: Role::User,
        }];

        let result = ServerHandle::start(ServerOptions {
            config: cfg,
            auto_migrate: true,
            handle_signals: false,
        })
        .await;
        assert!(result.is_err());
        let _ = std::fs::remove_dir_all(dir);
    }
}
