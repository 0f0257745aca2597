//! Database entities module

pub mod event;

pub use event::Entity as Event;
