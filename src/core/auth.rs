//! Authenticated principal supplied by the session layer.
//!
//! Credential issuance lives outside this crate; the core only receives an
//! already-authenticated `{id, role}` and checks the role against the minimum
//! each operation needs.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles ordered by privilege: `Client < Technician < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A customer looking at their own orders
    Client,
    /// Shop staff
    Technician,
    /// Shop owner / back office administrator
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Client => "client",
            Self::Technician => "technician",
            Self::Admin => "admin",
        })
    }
}

/// The caller of a core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identifier issued by the session layer
    pub id: i64,
    /// Capability level
    pub role: Role,
}

impl Principal {
    /// Creates a principal
    #[must_use]
    pub const fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    /// True when this principal holds `min` or a higher role
    #[must_use]
    pub fn has_role(&self, min: Role) -> bool {
        self.role >= min
    }

    /// Fails with [`Error::Forbidden`] unless the role is at least `min`.
    pub fn require(&self, min: Role, action: &'static str) -> Result<()> {
        if self.has_role(min) {
            Ok(())
        } else {
            tracing::warn!(principal = self.id, role = %self.role, action, "operation refused");
            Err(Error::Forbidden {
                role: self.role,
                action,
            })
        }
    }

    /// Shop staff (technician or admin) may mutate records.
    pub fn require_staff(&self, action: &'static str) -> Result<()> {
        self.require(Role::Technician, action)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Technician);
        assert!(Role::Technician > Role::Client);
    }

    #[test]
    fn test_require_refuses_lower_roles() {
        let client = Principal::new(1, Role::Client);
        let err = client.require_staff("soft delete").unwrap_err();
        assert!(matches!(
            err,
            Error::Forbidden {
                role: Role::Client,
                action: "soft delete"
            }
        ));

        let tech = Principal::new(2, Role::Technician);
        assert!(tech.require_staff("soft delete").is_ok());
        assert!(tech.require(Role::Admin, "correct stock").is_err());
        assert!(Principal::new(3, Role::Admin).require(Role::Admin, "correct stock").is_ok());
    }
}
