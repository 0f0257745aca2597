//! Request event aggregate
//!
//! One event per inference attempt or failed login, appended to a durable
//! log and never modified afterwards.

pub mod model;
pub mod repository;

pub use model::{Event, EventKind, EventSource, NewEvent};
pub use repository::EventRepository;
