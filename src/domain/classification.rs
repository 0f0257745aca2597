//! Classification result types and the classifier port

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{GatewayError, GatewayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Spam,
    Human,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Human => "human",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = GatewayError;

    /// Model servers label the non-spam class `humain`; both spellings map to [`Label::Human`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spam" => Ok(Self::Spam),
            "human" | "humain" | "ham" => Ok(Self::Human),
            other => Err(GatewayError::InferenceFailure(format!(
                "unknown class label '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: Label,
    /// Model confidence in `label`
    pub confidence: f64,
}

/// The model collaborator. Failures surface as `InferenceFailure`.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> GatewayResult<Classification>;
}
