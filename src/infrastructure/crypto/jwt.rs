//! JWT Token handling

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::Identity;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
    /// Issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: generate_secret(),
            expiration_minutes: 15,
            issuer: "spam-gateway".to_string(),
        }
    }
}

impl JwtConfig {
    /// Config with an explicit secret; an empty secret is replaced by a
    /// random per-process one.
    pub fn new(secret: &str, expiration_minutes: i64) -> Self {
        let secret = if secret.is_empty() {
            generate_secret()
        } else {
            secret.to_string()
        };

        Self {
            secret,
            expiration_minutes,
            ..Self::default()
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::minutes(self.expiration_minutes)
    }
}

/// Random 256-bit signing secret, hex encoded
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// JWT TokenClaims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// User role
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    /// Create claims for an identity issued at `now`
    pub fn new(identity: &Identity, config: &JwtConfig, now: DateTime<Utc>) -> Self {
        let exp = now + config.ttl();

        Self {
            sub: identity.username.clone(),
            role: identity.role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
        }
    }

    /// Expired strictly after `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Sign claims into a compact JWT
pub fn create_token(
    claims: &TokenClaims,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature and issuer, then decode.
///
/// Expiry is not checked here; callers compare `exp` against their own
/// clock with no leeway.
pub fn decode_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);
    validation.validate_exp = false;
    validation.leeway = 0;

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn test_create_and_decode_token() {
        let config = JwtConfig::default();
        let now = Utc::now();
        let claims = TokenClaims::new(&Identity::new("alice", Role::User), &config, now);
        let token = create_token(&claims, &config).unwrap();

        let decoded = decode_token(&token, &config).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.role, "user");
        assert_eq!(decoded.exp - decoded.iat, 15 * 60);
        assert!(!decoded.is_expired_at(now));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = JwtConfig::new("first-secret", 15);
        let other = JwtConfig::new("second-secret", 15);
        let claims = TokenClaims::new(&Identity::new("alice", Role::Admin), &config, Utc::now());
        let token = create_token(&claims, &config).unwrap();

        assert!(decode_token(&token, &other).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let config = JwtConfig::default();
        assert!(decode_token("invalid-token", &config).is_err());
    }

    #[test]
    fn test_empty_secret_gets_random_one() {
        let a = JwtConfig::new("", 15);
        let b = JwtConfig::new("", 15);
        assert_eq!(a.secret.len(), 64);
        assert_ne!(a.secret, b.secret);
    }
}
