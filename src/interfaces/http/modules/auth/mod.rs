//! Authentication module: login and caller profile

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
