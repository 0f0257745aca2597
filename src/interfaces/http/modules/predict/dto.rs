//! Predict DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::Label;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PredictRequest {
    #[validate(length(max = 10000, message = "text must be at most 10000 characters"))]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PredictResponse {
    pub text: String,
    pub prediction: Label,
    pub confidence: f64,
}
