pub mod auth;
pub mod dashboard;
pub mod health;
pub mod logs;
pub mod metrics;
pub mod predict;
pub mod request_id;
