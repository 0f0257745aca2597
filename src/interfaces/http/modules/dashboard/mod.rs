//! Dashboard series served from the background poller

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
