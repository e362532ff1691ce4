//! # Identifier Newtypes
//!
//! Grievance and comment identifiers are sequence numbers handed out by the
//! store. On the wire and in logs they render with a one-letter prefix
//! (`g12`, `c40`), which keeps a comment id from being mistaken for a
//! grievance id in a URL or a search term.
//!
//! Principal identifiers come from the identity provider and are opaque
//! strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! sequence_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(u64);

        impl $name {
            /// Build an identifier from a store sequence number.
            ///
            /// Returns `None` for zero; sequences start at one.
            pub fn from_sequence(n: u64) -> Option<Self> {
                (n > 0).then_some(Self(n))
            }

            /// The first identifier a store hands out.
            pub fn first() -> Self {
                Self(1)
            }

            /// The identifier following this one, or `None` once the
            /// sequence space is used up.
            pub fn next(self) -> Option<Self> {
                self.0.checked_add(1).map(Self)
            }

            /// The underlying sequence number.
            pub fn sequence(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let malformed = || ValidationError::MalformedId {
                    kind: $kind,
                    prefix: $prefix,
                    value: s.to_string(),
                };
                let digits = s.strip_prefix($prefix).ok_or_else(malformed)?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                let n: u64 = digits.parse().map_err(|_| malformed())?;
                Self::from_sequence(n).ok_or_else(malformed)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

sequence_id!(
    /// Identifier of a grievance, rendered `g<n>`.
    GrievanceId,
    'g',
    "grievance"
);

sequence_id!(
    /// Identifier of a comment, rendered `c<n>`. Unique across all grievances.
    CommentId,
    'c',
    "comment"
);

/// Identifier of an authenticated principal, as issued by the identity
/// provider. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Validate and wrap a principal identifier. Surrounding whitespace is
    /// trimmed.
    pub fn new(id: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "principal_id",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PrincipalId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrincipalId> for String {
    fn from(id: PrincipalId) -> Self {
        id.0
    }
}
