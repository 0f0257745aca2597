//! Authentication and authorization middleware for Axum
//!
//! `auth_middleware` verifies the bearer token and stores the caller in the
//! request extensions. `require_permission` runs after it and applies the
//! access gate for one operation, so denied requests never reach a handler.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{debug, warn};

use crate::application::{authorize, TokenService, VerifiedToken};
use crate::domain::{GatewayError, Identity, Operation};

/// Authentication state
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

/// Caller resolved from a verified bearer token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<VerifiedToken> for AuthenticatedUser {
    fn from(token: VerifiedToken) -> Self {
        Self {
            identity: token.identity,
            issued_at: token.issued_at,
            expires_at: token.expires_at,
        }
    }
}

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.identity.username
    }
}

fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Bearer token authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = {
        let Some(auth_header) = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        else {
            return GatewayError::MissingToken.into_response();
        };

        let Some(token) = extract_bearer(auth_header) else {
            return GatewayError::InvalidToken.into_response();
        };
        token.to_string()
    };

    match auth_state.tokens.verify(&token) {
        Ok(verified) => {
            let user = AuthenticatedUser::from(verified);
            debug!(username = %user.identity.username, role = %user.identity.role, "Authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            debug!(error = %e, "Token rejected");
            e.into_response()
        }
    }
}

/// Access gate for a single operation.
///
/// Mount with `middleware::from_fn_with_state(Operation::X, require_permission)`
/// inside an `auth_middleware` layer.
pub async fn require_permission(
    State(operation): State<Operation>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(user) = request.extensions().get::<AuthenticatedUser>() else {
        return GatewayError::MissingToken.into_response();
    };

    if let Err(e) = authorize(&user.identity, operation).into_result(operation) {
        counter!("gateway_access_denied_total", "operation" => operation.as_str()).increment(1);
        warn!(
            username = %user.identity.username,
            role = %user.identity.role,
            operation = %operation,
            "Access denied"
        );
        return e.into_response();
    }
    next.run(request).await
}
