//! Classifier backends

mod keyword;
mod remote;

use std::sync::Arc;
use std::time::Duration;

pub use keyword::KeywordClassifier;
pub use remote::RemoteClassifier;

use crate::config::{InferenceBackend, InferenceConfig};
use crate::domain::{Classifier, GatewayError, GatewayResult};

/// Build the configured backend
pub fn build_classifier(config: &InferenceConfig) -> GatewayResult<Arc<dyn Classifier>> {
    match config.backend {
        InferenceBackend::Keyword => Ok(Arc::new(KeywordClassifier::new())),
        InferenceBackend::Remote => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                GatewayError::InvalidConfiguration(
                    "inference.endpoint is required for the remote backend".to_string(),
                )
            })?;
            let classifier =
                RemoteClassifier::new(endpoint, Duration::from_secs(config.timeout_secs))?;
            Ok(Arc::new(classifier))
        }
    }
}
