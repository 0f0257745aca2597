//! Event recorder
//!
//! Appends one event per inference attempt or failed login. The write runs
//! on its own task, so a caller dropped mid-request (client disconnect)
//! never abandons an insert halfway.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{debug, warn};

use crate::domain::{
    EventKind, EventRepository, EventSource, GatewayError, GatewayResult, NewEvent,
};

#[derive(Clone)]
pub struct EventRecorder {
    repository: Arc<dyn EventRepository>,
}

impl EventRecorder {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    pub async fn record(
        &self,
        kind: EventKind,
        actor: &str,
        source: EventSource,
    ) -> GatewayResult<()> {
        self.record_at(Utc::now(), kind, actor, source).await
    }

    /// Fails only with `StorageUnavailable`
    pub async fn record_at(
        &self,
        timestamp: DateTime<Utc>,
        kind: EventKind,
        actor: &str,
        source: EventSource,
    ) -> GatewayResult<()> {
        let repository = self.repository.clone();
        let event = NewEvent::new(timestamp, kind, actor, source);

        let stored = tokio::spawn(async move { repository.append(event).await })
            .await
            .map_err(|e| GatewayError::StorageUnavailable(format!("event write aborted: {}", e)))?
            .map_err(|e| match e {
                GatewayError::StorageUnavailable(_) => e,
                other => GatewayError::StorageUnavailable(other.to_string()),
            })?;

        counter!("gateway_events_recorded_total", "kind" => kind.as_str()).increment(1);
        debug!(id = stored.id, kind = %kind, source = %source, actor = %stored.actor, "Event recorded");
        Ok(())
    }

    /// Record, logging and swallowing storage failures
    pub async fn record_best_effort(&self, kind: EventKind, actor: &str, source: EventSource) {
        if let Err(e) = self.record(kind, actor, source).await {
            counter!("gateway_event_write_failures_total").increment(1);
            warn!(error = %e, kind = %kind, source = %source, "Event write lost");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::Event;
    use crate::infrastructure::database::{test_database, SeaOrmEventRepository};
    use async_trait::async_trait;

    /// Repository whose store is always down
    pub(crate) struct UnavailableRepository;

    #[async_trait]
    impl EventRepository for UnavailableRepository {
        async fn append(&self, _event: NewEvent) -> GatewayResult<Event> {
            Err(GatewayError::StorageUnavailable("disk full".to_string()))
        }

        async fn since(&self, _from: DateTime<Utc>) -> GatewayResult<Vec<Event>> {
            Err(GatewayError::StorageUnavailable("disk full".to_string()))
        }

        async fn count(&self) -> GatewayResult<u64> {
            Err(GatewayError::StorageUnavailable("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn record_appends_to_repository() {
        let repo = Arc::new(SeaOrmEventRepository::new(test_database().await));
        let recorder = EventRecorder::new(repo.clone());

        recorder
            .record(EventKind::Success, "alice", EventSource::Predict)
            .await
            .unwrap();
        recorder
            .record_best_effort(EventKind::Error, "bob", EventSource::Login)
            .await;

        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unavailable_store_is_reported_not_fatal() {
        let recorder = EventRecorder::new(Arc::new(UnavailableRepository));

        let err = recorder
            .record(EventKind::Success, "alice", EventSource::Predict)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::StorageUnavailable(_)));

        // Best-effort path swallows the failure
        recorder
            .record_best_effort(EventKind::Success, "alice", EventSource::Predict)
            .await;
    }
}
