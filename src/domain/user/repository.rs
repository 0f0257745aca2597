use async_trait::async_trait;

use super::User;
use crate::domain::GatewayResult;

/// Source of user credentials.
///
/// The gateway only reads from it; users are fixed for the lifetime of the
/// process.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> GatewayResult<Option<User>>;
}
