//! # Spam Gateway
//!
//! Role-gated HTTP gateway in front of a spam/human text classifier.
//!
//! ## Architecture
//!
//! - **domain**: roles, permissions, events, buckets and the error taxonomy
//! - **application**: token service, access gate, event recorder, bucket
//!   aggregation, inference facade and the dashboard poller
//! - **infrastructure**: SQLite event store, credentials, crypto, classifier
//!   backends, log files and shutdown plumbing
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: process bootstrap shared by the binary and the tests

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig};

pub use interfaces::http::create_api_router;

pub use server::{init_tracing, ServerHandle, ServerOptions};
