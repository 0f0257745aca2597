//! HTTP model server backend
//!
//! Posts `{"text": ..}` and expects `{"predicted_class": .., "confidence": ..}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Classification, Classifier, GatewayError, GatewayResult, Label};

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(alias = "prediction")]
    predicted_class: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

#[derive(Clone)]
pub struct RemoteClassifier {
    client: Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(endpoint: &str, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::InvalidConfiguration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

fn inference_err(e: reqwest::Error) -> GatewayError {
    GatewayError::InferenceFailure(format!("model server: {}", e))
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> GatewayResult<Classification> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&PredictRequest { text })
            .send()
            .await
            .map_err(inference_err)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(status, body = %body, "Model server rejected request");
            return Err(GatewayError::InferenceFailure(format!(
                "model server returned {}: {}",
                status, body
            )));
        }

        let body: PredictResponse = resp.json().await.map_err(inference_err)?;
        let label: Label = body.predicted_class.parse()?;

        Ok(Classification {
            label,
            confidence: body.confidence,
        })
    }
}
