//! Access gate: pure role/operation authorization

use crate::domain::{GatewayError, GatewayResult, Identity, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    /// `Denied` becomes `Forbidden(operation)`
    pub fn into_result(self, operation: Operation) -> GatewayResult<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied => Err(GatewayError::Forbidden(operation)),
        }
    }
}

/// Allowed iff `operation` is in the permission set of the caller's role
pub fn authorize(identity: &Identity, operation: Operation) -> Decision {
    if identity.role.permissions().contains(operation) {
        Decision::Allowed
    } else {
        Decision::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn full_role_operation_matrix() {
        let expected = [
            (Role::Admin, Operation::Predict, true),
            (Role::Admin, Operation::Logs, true),
            (Role::Admin, Operation::Metrics, true),
            (Role::User, Operation::Predict, true),
            (Role::User, Operation::Logs, false),
            (Role::User, Operation::Metrics, false),
            (Role::Normal, Operation::Predict, false),
            (Role::Normal, Operation::Logs, false),
            (Role::Normal, Operation::Metrics, false),
        ];

        for (role, operation, allowed) in expected {
            let identity = Identity::new("someone", role);
            assert_eq!(
                authorize(&identity, operation) == Decision::Allowed,
                allowed,
                "{} / {}",
                role,
                operation
            );
        }
    }

    #[test]
    fn denied_maps_to_forbidden() {
        let identity = Identity::new("nobody", Role::Normal);
        let err = authorize(&identity, Operation::Metrics)
            .into_result(Operation::Metrics)
            .unwrap_err();
        assert_eq!(err, GatewayError::Forbidden(Operation::Metrics));
    }
}
