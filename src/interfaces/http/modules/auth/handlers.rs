//! Authentication API handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Extension, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};

use super::dto::{CurrentUser, LoginResponse};
use crate::application::TokenService;
use crate::domain::GatewayError;
use crate::interfaces::http::middleware::AuthenticatedUser;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub tokens: Arc<TokenService>,
}

/// Decode `Authorization: Basic base64(username:password)`
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?.trim();
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Authentication",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    headers: HeaderMap,
) -> Result<Json<LoginResponse>, GatewayError> {
    let (username, password) =
        basic_credentials(&headers).ok_or(GatewayError::Unauthenticated)?;

    let issued = state.tokens.issue(&username, &password).await?;
    let expires_in = (issued.expires_at - issued.issued_at).num_seconds();

    Ok(Json(LoginResponse {
        access_token: issued.access_token,
        token_type: "bearer".to_string(),
        expires_in,
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current caller", body = CurrentUser),
        (status = 401, description = "Missing, invalid or expired token")
    )
)]
pub async fn get_current_user(Extension(user): Extension<AuthenticatedUser>) -> Json<CurrentUser> {
    Json(CurrentUser {
        username: user.identity.username.clone(),
        role: user.identity.role,
        permissions: user.identity.role.permissions().iter().collect(),
        expires_at: user.expires_at,
    })
}
