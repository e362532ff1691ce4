//! # Grievance Status
//!
//! The four lifecycle states. Wire names are kebab-case (`in-progress`).
//! Which moves between them are allowed is decided by the lifecycle crate's
//! transition policy, not here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lifecycle state of a grievance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrievanceStatus {
    /// Submitted, awaiting triage. Initial state.
    Pending,
    /// An administrator is working on it.
    InProgress,
    /// Closed with a resolution.
    Resolved,
    /// Closed without action.
    Rejected,
}

impl GrievanceStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [GrievanceStatus; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Resolved,
        Self::Rejected,
    ];

    /// Return the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the grievance is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

impl Default for GrievanceStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for GrievanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrievanceStatus {
    type Err = ValidationError;

    /// Parse a wire name. Matching is exact; `In-Progress` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}
