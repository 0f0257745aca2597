//! User aggregate
//!
//! Contains the User entity, the caller identity carried by tokens, and the
//! credential store interface.

pub mod model;
pub mod repository;

// Re-export model types
pub use model::{Identity, Role, User};

// Re-export repository trait
pub use repository::CredentialStore;
