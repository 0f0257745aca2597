//! Domain errors

use thiserror::Error;

use super::permission::Operation;

/// Error taxonomy shared by every layer of the gateway.
///
/// Authentication and authorization failures are terminal for the request.
/// `StorageUnavailable` is swallowed on the predict path and surfaced as a
/// 500 on the log endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Bad credentials at login
    #[error("Invalid credentials")]
    Unauthenticated,

    /// No bearer token on a protected call
    #[error("Missing authentication token")]
    MissingToken,

    /// Malformed token or bad signature
    #[error("Invalid authentication token")]
    InvalidToken,

    /// Signature valid, expiry passed
    #[error("Token has expired")]
    Expired,

    /// Valid identity, role lacks the operation
    #[error("Access denied: '{0}' permission required")]
    Forbidden(Operation),

    /// The classification collaborator rejected the input or failed
    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    /// Event store or log file could not be written or read
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Malformed query parameters or body outside the predict path
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Whether the error stems from the caller's credentials or token.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::MissingToken | Self::InvalidToken | Self::Expired
        )
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_classified() {
        assert!(GatewayError::Unauthenticated.is_auth_failure());
        assert!(GatewayError::Expired.is_auth_failure());
        assert!(!GatewayError::Forbidden(Operation::Logs).is_auth_failure());
        assert!(!GatewayError::StorageUnavailable("disk".into()).is_auth_failure());
    }

    #[test]
    fn forbidden_names_the_operation() {
        let msg = GatewayError::Forbidden(Operation::Predict).to_string();
        assert_eq!(msg, "Access denied: 'predict' permission required");
    }
}
