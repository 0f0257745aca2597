//! Spam Gateway server
//!
//! ```sh
//! # Run with default config (~/.config/spam-gateway/config.toml)
//! spam-gateway
//!
//! # Custom config path and port
//! spam-gateway --config /etc/spam-gateway/config.toml --port 9000
//!
//! # Validate config without starting
//! spam-gateway --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use spam_gateway::config::{AppConfig, InferenceBackend};
use spam_gateway::server::{init_tracing, ServerHandle, ServerOptions};

/// Role-gated spam classification gateway.
#[derive(Parser, Debug)]
#[command(
    name = "spam-gateway",
    version,
    about = "Role-gated spam/human text classification gateway",
    long_about = "HTTP gateway in front of a spam/human classifier with token \
                  authentication, per-role permissions and bucketed request metrics.\n\n\
                  Default config: ~/.config/spam-gateway/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "SPAM_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the HTTP listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(spam_gateway::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }
    if cli.port.is_some() || cli.log_level.is_some() {
        info!(
            "CLI overrides: port = {:?}, log_level = {:?}",
            cli.port, cli.log_level
        );
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.listen_address());
        println!("   Database    : {}", config.database.connection_url());
        println!("   Log level   : {}", config.logging.level);
        println!("   Users       : {}", config.users.len());
        match config.inference.backend {
            InferenceBackend::Keyword => println!("   Inference   : keyword"),
            InferenceBackend::Remote => println!(
                "   Inference   : remote ({})",
                config.inference.endpoint.as_deref().unwrap_or("-")
            ),
        }
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        handle_signals: true,
    })
    .await?;

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;

    Ok(())
}
