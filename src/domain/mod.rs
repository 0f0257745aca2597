//! Domain layer - core types and traits of the gateway
//!
//! Nothing here performs I/O; repositories and stores are traits implemented
//! in the infrastructure layer.

pub mod bucket;
pub mod classification;
pub mod error;
pub mod event;
pub mod permission;
pub mod user;

// Re-export commonly used types
pub use bucket::{align_to_bucket, Bucket};
pub use classification::{Classification, Classifier, Label};
pub use error::{GatewayError, GatewayResult};
pub use event::{Event, EventKind, EventRepository, EventSource, NewEvent};
pub use permission::{Operation, PermissionSet};
pub use user::{CredentialStore, Identity, Role, User};
