//! Inference facade
//!
//! Wraps the classifier collaborator and feeds every attempt, successful or
//! not, into the counters, the event log and the request log. Metric and log
//! writes are best effort: their failure never changes the response.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::application::{EventRecorder, RequestCounters};
use crate::domain::{Classification, Classifier, EventKind, EventSource, GatewayError, GatewayResult};
use crate::infrastructure::RequestLog;

pub struct InferenceFacade {
    classifier: Arc<dyn Classifier>,
    recorder: EventRecorder,
    counters: Arc<RequestCounters>,
    request_log: Arc<RequestLog>,
}

impl InferenceFacade {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        recorder: EventRecorder,
        counters: Arc<RequestCounters>,
        request_log: Arc<RequestLog>,
    ) -> Self {
        Self {
            classifier,
            recorder,
            counters,
            request_log,
        }
    }

    pub async fn predict(&self, actor: &str, text: &str) -> GatewayResult<Classification> {
        self.counters.record_request();
        self.append_log(&format!("Request from {}: {}", actor, text)).await;

        match self.classifier.classify(text).await {
            Ok(classification) => {
                counter!("predictions_total", "label" => classification.label.as_str()).increment(1);
                self.recorder
                    .record_best_effort(EventKind::Success, actor, EventSource::Predict)
                    .await;
                self.append_log(&format!(
                    "Response to {}: {} (confidence {:.4})",
                    actor, classification.label, classification.confidence
                ))
                .await;
                info!(actor = %actor, label = %classification.label, "Prediction served");
                Ok(classification)
            }
            Err(e) => Err(self.fail(actor, e).await),
        }
    }

    /// Count a predict request that never reached the classifier, such as
    /// an unreadable body.
    pub async fn reject(&self, actor: &str, reason: GatewayError) -> GatewayError {
        self.counters.record_request();
        self.fail(actor, reason).await
    }

    async fn fail(&self, actor: &str, error: GatewayError) -> GatewayError {
        self.counters.record_error();
        self.recorder
            .record_best_effort(EventKind::Error, actor, EventSource::Predict)
            .await;
        self.append_log(&format!("Error for {}: {}", actor, error)).await;
        warn!(actor = %actor, error = %error, "Prediction failed");
        error
    }

    async fn append_log(&self, message: &str) {
        if let Err(e) = self.request_log.append_request(message).await {
            warn!(error = %e, "Request log write lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::event_recorder::tests::UnavailableRepository;
    use crate::domain::{EventRepository, Label};
    use crate::infrastructure::database::{test_database, SeaOrmEventRepository};
    use crate::infrastructure::KeywordClassifier;

    fn temp_log() -> Arc<RequestLog> {
        let dir = std::env::temp_dir().join(format!("spam-gateway-facade-{}", uuid::Uuid::new_v4()));
        Arc::new(RequestLog::new(dir.join("app.log"), dir.join("metrics.log")))
    }

    #[tokio::test]
    async fn success_and_failure_are_counted_and_recorded() {
        let repo = Arc::new(SeaOrmEventRepository::new(test_database().await));
        let counters = Arc::new(RequestCounters::new());
        let log = temp_log();
        let facade = InferenceFacade::new(
            Arc::new(KeywordClassifier::new()),
            EventRecorder::new(repo.clone()),
            counters.clone(),
            log.clone(),
        );

        let result = facade.predict("alice", "buy now!!!").await.unwrap();
        assert_eq!(result.label, Label::Spam);

        let err = facade.predict("alice", "").await.unwrap_err();
        assert!(matches!(err, GatewayError::InferenceFailure(_)));

        let snap = counters.snapshot();
        assert_eq!(snap.total_request_count, 2);
        assert_eq!(snap.error_count, 1);
        assert_eq!(repo.count().await.unwrap(), 2);

        let contents = log.read_requests().await.unwrap();
        assert!(contents.contains("Response to alice: spam"));
        assert!(contents.contains("Error for alice"));
    }

    #[tokio::test]
    async fn storage_outage_does_not_fail_prediction() {
        let counters = Arc::new(RequestCounters::new());
        let facade = InferenceFacade::new(
            Arc::new(KeywordClassifier::new()),
            EventRecorder::new(Arc::new(UnavailableRepository)),
            counters.clone(),
            temp_log(),
        );

        let result = facade.predict("bob", "lunch at noon?").await.unwrap();
        assert_eq!(result.label, Label::Human);
        assert_eq!(counters.snapshot().total_request_count, 1);
    }

    #[tokio::test]
    async fn rejected_body_counts_as_error() {
        let repo = Arc::new(SeaOrmEventRepository::new(test_database().await));
        let counters = Arc::new(RequestCounters::new());
        let facade = InferenceFacade::new(
            Arc::new(KeywordClassifier::new()),
            EventRecorder::new(repo.clone()),
            counters.clone(),
            temp_log(),
        );

        let err = facade
            .reject("carol", GatewayError::InferenceFailure("missing text".to_string()))
            .await;
        assert!(matches!(err, GatewayError::InferenceFailure(_)));
        assert_eq!(counters.snapshot().error_count, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
