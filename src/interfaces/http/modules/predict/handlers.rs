//! Predict handler

use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use super::dto::{PredictRequest, PredictResponse};
use crate::application::InferenceFacade;
use crate::domain::GatewayError;
use crate::interfaces::http::common::{ValidatedJson, ValidatedJsonRejection};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct PredictState {
    pub inference: Arc<InferenceFacade>,
}

/// Unreadable bodies are counted as failed predictions, like classifier errors.
#[utoipa::path(
    post,
    path = "/predict",
    tag = "Inference",
    request_body = PredictRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Classification result", body = PredictResponse),
        (status = 400, description = "Body or text could not be processed"),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 403, description = "Role lacks the predict permission")
    )
)]
pub async fn predict(
    State(state): State<PredictState>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<ValidatedJson<PredictRequest>, ValidatedJsonRejection>,
) -> Result<Json<PredictResponse>, GatewayError> {
    let request = match body {
        Ok(ValidatedJson(request)) => request,
        Err(rejection) => {
            return Err(state
                .inference
                .reject(user.username(), GatewayError::from(rejection))
                .await)
        }
    };

    let classification = state.inference.predict(user.username(), &request.text).await?;

    Ok(Json(PredictResponse {
        text: request.text,
        prediction: classification.label,
        confidence: classification.confidence,
    }))
}
