//! Infrastructure layer - external concerns

pub mod classifier;
pub mod credentials;
pub mod crypto;
pub mod database;
pub mod request_log;
pub mod server;

pub use classifier::{build_classifier, KeywordClassifier, RemoteClassifier};
pub use credentials::InMemoryCredentialStore;
pub use database::{init_database, DatabaseConfig, SeaOrmEventRepository};
pub use request_log::RequestLog;
pub use server::{ShutdownCoordinator, ShutdownSignal};
