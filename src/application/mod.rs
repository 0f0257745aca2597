//! Application layer - the gateway's use cases

pub mod access_gate;
pub mod bucket_aggregator;
pub mod dashboard_poller;
pub mod event_recorder;
pub mod inference;
pub mod request_counters;
pub mod token_service;

pub use access_gate::{authorize, Decision};
pub use bucket_aggregator::BucketAggregator;
pub use dashboard_poller::{CounterSample, DashboardPoller, DashboardSnapshot, PollerConfig};
pub use event_recorder::EventRecorder;
pub use inference::InferenceFacade;
pub use request_counters::{CounterSnapshot, RequestCounters};
pub use token_service::{IssuedToken, TokenService, VerifiedToken};
