//! # Principals and the Identity Contract
//!
//! A [`Principal`] is the authenticated actor behind a request: an id, a
//! display name and one of two roles. The core never authenticates anyone.
//! It trusts whatever an [`IdentityProvider`] hands it, and adapters (the
//! bearer-token middleware in `redress-api`, [`StaticIdentity`] for tests and
//! tooling) decide how that principal is established.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::PrincipalId;

/// The two-role gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Submits grievances and sees only their own.
    User,
    /// Triages every grievance and changes status.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

/// An authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier issued by the identity provider.
    pub id: PrincipalId,
    /// Display name, copied onto records the principal writes.
    pub name: String,
    /// Role at the time of the request.
    pub role: Role,
}

impl Principal {
    /// Build a principal, trimming the display name.
    pub fn new(id: PrincipalId, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
            role,
        }
    }

    /// Whether this principal holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Source of the current authenticated principal.
///
/// `None` means the caller is unauthenticated.
pub trait IdentityProvider {
    /// The principal acting in the current context, if any.
    fn current_principal(&self) -> Option<Principal>;
}

/// Identity provider that always yields the same principal (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<Principal>);

impl StaticIdentity {
    /// Always authenticate as `principal`.
    pub fn new(principal: Principal) -> Self {
        Self(Some(principal))
    }

    /// Never authenticate anyone.
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_principal(&self) -> Option<Principal> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PrincipalId {
        PrincipalId::new(s).unwrap()
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" User ".parse::<Role>().unwrap(), Role::User);
        assert!(matches!(
            "superuser".parse::<Role>(),
            Err(ValidationError::UnknownRole(_))
        ));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn principal_admin_check() {
        assert!(Principal::new(pid("a1"), "Ann", Role::Admin).is_admin());
        assert!(!Principal::new(pid("u1"), "Uma", Role::User).is_admin());
    }

    #[test]
    fn principal_name_is_trimmed() {
        let p = Principal::new(pid("u1"), "  Uma  ", Role::User);
        assert_eq!(p.name, "Uma");
    }

    #[test]
    fn static_identity_yields_fixed_principal() {
        let p = Principal::new(pid("u1"), "Uma", Role::User);
        assert_eq!(StaticIdentity::new(p.clone()).current_principal(), Some(p));
        assert_eq!(StaticIdentity::anonymous().current_principal(), None);
    }
}
