//! Static credential store
//!
//! Users come from configuration and never change at runtime. Plain
//! passwords are bcrypt-hashed once at construction so that only hashes are
//! held in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::config::UserEntry;
use crate::domain::{CredentialStore, GatewayError, GatewayResult, User};
use crate::infrastructure::crypto::{hash_password_with_cost, is_bcrypt_hash};

pub struct InMemoryCredentialStore {
    users: HashMap<String, User>,
}

impl InMemoryCredentialStore {
    /// Build from already-hashed users. Usernames must be unique.
    pub fn new(users: impl IntoIterator<Item = User>) -> GatewayResult<Self> {
        let mut map = HashMap::new();
        for user in users {
            if map.contains_key(&user.username) {
                return Err(GatewayError::InvalidConfiguration(format!(
                    "duplicate username '{}'",
                    user.username
                )));
            }
            map.insert(user.username.clone(), user);
        }
        Ok(Self { users: map })
    }

    /// Build from configuration entries, hashing plain passwords with `bcrypt_cost`.
    pub fn from_entries(entries: &[UserEntry], bcrypt_cost: u32) -> GatewayResult<Self> {
        let users = entries
            .iter()
            .map(|entry| {
                let password_hash = match (&entry.password_hash, &entry.password) {
                    (Some(hash), _) if is_bcrypt_hash(hash) => hash.clone(),
                    (Some(_), _) => {
                        return Err(GatewayError::InvalidConfiguration(format!(
                            "password_hash of '{}' is not a bcrypt hash",
                            entry.username
                        )))
                    }
                    (None, Some(plain)) => hash_password_with_cost(plain, bcrypt_cost)
                        .map_err(|e| GatewayError::InvalidConfiguration(e.to_string()))?,
                    (None, None) => {
                        return Err(GatewayError::InvalidConfiguration(format!(
                            "user '{}' has no password",
                            entry.username
                        )))
                    }
                };

                debug!(username = %entry.username, role = %entry.role, "Loaded user");
                Ok(User {
                    username: entry.username.clone(),
                    password_hash,
                    role: entry.role,
                })
            })
            .collect::<GatewayResult<Vec<_>>>()?;

        Self::new(users)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> GatewayResult<Option<User>> {
        Ok(self.users.get(username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::infrastructure::crypto::verify_password;

    #[tokio::test]
    async fn plain_passwords_are_hashed() {
        let store = InMemoryCredentialStore::from_entries(
            &[UserEntry::plain("alice", "wonderland", Role::User)],
            4,
        )
        .unwrap();

        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.role, Role::User);
        assert_ne!(alice.password_hash, "wonderland");
        assert!(verify_password("wonderland", &alice.password_hash).unwrap());
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let entries = [
            UserEntry::plain("alice", "a", Role::User),
            UserEntry::plain("alice", "b", Role::Admin),
        ];
        let result = InMemoryCredentialStore::from_entries(&entries, 4);
        assert!(matches!(result, Err(GatewayError::InvalidConfiguration(_))));
    }

    #[test]
    fn non_bcrypt_hash_is_rejected() {
        let entry = UserEntry {
            username: "alice".to_string(),
            password: None,
            password_hash: Some("md5:abc".to_string()),
            role: Role::User,
        };
        assert!(InMemoryCredentialStore::from_entries(&[entry], 4).is_err());
    }
}
