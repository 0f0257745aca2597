use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Event, NewEvent};
use crate::domain::GatewayResult;

/// Append-only event log.
///
/// Implementations must make every `append` a single atomic write so that
/// concurrent requests never interleave partial records.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn append(&self, event: NewEvent) -> GatewayResult<Event>;

    /// All events with `timestamp >= from`, ordered by timestamp.
    async fn since(&self, from: DateTime<Utc>) -> GatewayResult<Vec<Event>>;

    async fn count(&self) -> GatewayResult<u64>;
}
