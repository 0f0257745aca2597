//! Token service
//!
//! Issues signed, time-limited tokens for verified credentials and verifies
//! them on every protected call. There is no revocation: a token stays valid
//! until its expiry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::application::EventRecorder;
use crate::domain::{
    CredentialStore, EventKind, EventSource, GatewayError, GatewayResult, Identity, Role,
};
use crate::infrastructure::crypto::{create_token, decode_token, verify_password, JwtConfig, TokenClaims};

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A token that passed signature and expiry checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    credentials: Arc<dyn CredentialStore>,
    recorder: EventRecorder,
    jwt: JwtConfig,
}

impl TokenService {
    pub fn new(credentials: Arc<dyn CredentialStore>, recorder: EventRecorder, jwt: JwtConfig) -> Self {
        Self {
            credentials,
            recorder,
            jwt,
        }
    }

    pub async fn issue(&self, username: &str, password: &str) -> GatewayResult<IssuedToken> {
        self.issue_at(username, password, Utc::now()).await
    }

    /// Verify credentials and sign a token issued at `now`.
    ///
    /// Unknown users and wrong passwords both fail with `Unauthenticated`
    /// and record a login error event.
    pub async fn issue_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> GatewayResult<IssuedToken> {
        let user = self.credentials.find_by_username(username).await?;

        let verified = match &user {
            Some(user) => {
                let password = password.to_string();
                let hash = user.password_hash.clone();
                tokio::task::spawn_blocking(move || verify_password(&password, &hash))
                    .await
                    .map_err(|e| GatewayError::Internal(format!("password check aborted: {}", e)))?
                    .map_err(|e| GatewayError::Internal(format!("password check failed: {}", e)))?
            }
            None => false,
        };

        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!(username = %username, "Login failed");
                self.recorder
                    .record_best_effort(EventKind::Error, username, EventSource::Login)
                    .await;
                return Err(GatewayError::Unauthenticated);
            }
        };

        let identity = Identity::from(&user);
        let claims = TokenClaims::new(&identity, &self.jwt, now);
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| GatewayError::Internal("token expiry out of range".to_string()))?;
        let access_token = create_token(&claims, &self.jwt)
            .map_err(|e| GatewayError::Internal(format!("token signing failed: {}", e)))?;

        info!(username = %identity.username, role = %identity.role, "Token issued");

        Ok(IssuedToken {
            access_token,
            identity,
            issued_at: now,
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> GatewayResult<VerifiedToken> {
        self.verify_at(token, Utc::now())
    }

    /// Accepted while `now <= expiry`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> GatewayResult<VerifiedToken> {
        let claims = decode_token(token, &self.jwt).map_err(|_| GatewayError::InvalidToken)?;

        if claims.is_expired_at(now) {
            return Err(GatewayError::Expired);
        }

        let role: Role = claims.role.parse().map_err(|_| GatewayError::InvalidToken)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(GatewayError::InvalidToken)?;
        let expires_at = claims.expires_at().ok_or(GatewayError::InvalidToken)?;

        Ok(VerifiedToken {
            identity: Identity::new(claims.sub, role),
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserEntry;
    use crate::domain::EventRepository;
    use crate::infrastructure::database::{test_database, SeaOrmEventRepository};
    use crate::infrastructure::InMemoryCredentialStore;
    use chrono::Duration;

    async fn service() -> (TokenService, Arc<SeaOrmEventRepository>) {
        let store = InMemoryCredentialStore::from_entries(
            &[
                UserEntry::plain("alice", "wonderland", Role::User),
                UserEntry::plain("root", "toor", Role::Admin),
            ],
            4,
        )
        .unwrap();
        let repo = Arc::new(SeaOrmEventRepository::new(test_database().await));
        let service = TokenService::new(
            Arc::new(store),
            EventRecorder::new(repo.clone()),
            JwtConfig::new("test-secret", 15),
        );
        (service, repo)
    }

    #[tokio::test]
    async fn token_valid_until_expiry_then_expired() {
        let (service, _) = service().await;
        let t0 = Utc::now();

        let issued = service.issue_at("alice", "wonderland", t0).await.unwrap();
        assert_eq!(issued.identity, Identity::new("alice", Role::User));

        let verified = service.verify_at(&issued.access_token, t0).unwrap();
        assert_eq!(verified.identity.role, Role::User);
        assert_eq!(verified.expires_at, issued.expires_at);

        let at_expiry = t0 + Duration::minutes(15);
        assert!(service.verify_at(&issued.access_token, at_expiry).is_ok());

        let after = at_expiry + Duration::seconds(1);
        assert_eq!(
            service.verify_at(&issued.access_token, after),
            Err(GatewayError::Expired)
        );
    }

    #[tokio::test]
    async fn wrong_password_is_unauthenticated_and_recorded() {
        let (service, repo) = service().await;

        let err = service.issue("alice", "guess").await.unwrap_err();
        assert_eq!(err, GatewayError::Unauthenticated);

        let err = service.issue("mallory", "anything").await.unwrap_err();
        assert_eq!(err, GatewayError::Unauthenticated);

        let events = repo.since(Utc::now() - Duration::minutes(1)).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| e.kind == EventKind::Error && e.source == EventSource::Login));
    }

    #[tokio::test]
    async fn tampered_or_foreign_tokens_are_invalid() {
        let (service, _) = service().await;
        let issued = service.issue("root", "toor").await.unwrap();

        let mut tampered = issued.access_token.clone();
        tampered.push('x');
        assert_eq!(service.verify(&tampered), Err(GatewayError::InvalidToken));
        assert_eq!(service.verify("not.a.jwt"), Err(GatewayError::InvalidToken));

        let other = TokenService::new(
            Arc::new(InMemoryCredentialStore::new(Vec::new()).unwrap()),
            service.recorder.clone(),
            JwtConfig::new("another-secret", 15),
        );
        assert_eq!(
            other.verify(&issued.access_token),
            Err(GatewayError::InvalidToken)
        );
    }
}
