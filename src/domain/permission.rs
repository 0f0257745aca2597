//! Permission matrix
//!
//! Maps every [`Role`] to the set of operations it may invoke. The mapping is
//! an exhaustive `match`, so adding a role without deciding its permissions
//! fails to compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::GatewayError;
use super::user::Role;

/// A gated operation of the HTTP surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Predict,
    Logs,
    Metrics,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Predict, Operation::Logs, Operation::Metrics];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Predict => "predict",
            Self::Logs => "logs",
            Self::Metrics => "metrics",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Predict => 0b001,
            Self::Logs => 0b010,
            Self::Metrics => 0b100,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "predict" => Ok(Self::Predict),
            "logs" => Ok(Self::Logs),
            "metrics" => Ok(Self::Metrics),
            other => Err(GatewayError::InvalidConfiguration(format!(
                "unknown operation '{}'",
                other
            ))),
        }
    }
}

/// Set of operations allowed for a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionSet(u8);

impl PermissionSet {
    pub const EMPTY: PermissionSet = PermissionSet(0);

    pub const fn with(self, operation: Operation) -> Self {
        Self(self.0 | operation.bit())
    }

    pub const fn contains(&self, operation: Operation) -> bool {
        self.0 & operation.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Operation> {
        let set = *self;
        Operation::ALL.into_iter().filter(move |op| set.contains(*op))
    }
}

impl FromIterator<Operation> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, PermissionSet::with)
    }
}

impl Role {
    /// The permission matrix.
    pub const fn permissions(self) -> PermissionSet {
        match self {
            Role::Admin => PermissionSet::EMPTY
                .with(Operation::Predict)
                .with(Operation::Logs)
                .with(Operation::Metrics),
            Role::User => PermissionSet::EMPTY.with(Operation::Predict),
            Role::Normal => PermissionSet::EMPTY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_everything() {
        let perms = Role::Admin.permissions();
        assert_eq!(perms.iter().collect::<Vec<_>>(), Operation::ALL.to_vec());
    }

    #[test]
    fn user_only_predicts() {
        let perms = Role::User.permissions();
        assert!(perms.contains(Operation::Predict));
        assert!(!perms.contains(Operation::Logs));
        assert!(!perms.contains(Operation::Metrics));
    }

    #[test]
    fn normal_has_defined_empty_set() {
        assert!(Role::Normal.permissions().is_empty());
        assert_eq!(Role::Normal.permissions(), PermissionSet::EMPTY);
    }

    #[test]
    fn set_from_iterator() {
        let set: PermissionSet = [Operation::Metrics, Operation::Predict].into_iter().collect();
        assert!(set.contains(Operation::Metrics));
        assert!(set.contains(Operation::Predict));
        assert!(!set.contains(Operation::Logs));
    }

    #[test]
    fn operation_parsing() {
        assert_eq!("logs".parse::<Operation>().unwrap(), Operation::Logs);
        assert!("delete".parse::<Operation>().is_err());
    }
}
