//! # Transition Policy
//!
//! Which status moves an admin may make. Deployments pick one policy in
//! configuration.
//!
//! | From          | `Workflow` allows              |
//! |---------------|--------------------------------|
//! | `pending`     | `in-progress`, `rejected`      |
//! | `in-progress` | `resolved`, `rejected`, `pending` |
//! | `resolved`    | `in-progress` (reopen)         |
//! | `rejected`    | `pending` (reopen)             |
//!
//! `Unrestricted` allows every move, including re-applying the current
//! status.

use std::fmt;
use std::str::FromStr;

use redress_core::GrievanceStatus;
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// Rule set for admin status changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any status to any status.
    #[default]
    Unrestricted,
    /// The triage graph in the module-level table.
    Workflow,
}

impl TransitionPolicy {
    /// Return the configuration name of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unrestricted => "unrestricted",
            Self::Workflow => "workflow",
        }
    }

    /// Statuses reachable from `from` under this policy.
    pub fn valid_transitions(&self, from: GrievanceStatus) -> &'static [GrievanceStatus] {
        use GrievanceStatus::*;
        match self {
            Self::Unrestricted => &GrievanceStatus::ALL,
            Self::Workflow => match from {
                Pending => &[InProgress, Rejected],
                InProgress => &[Resolved, Rejected, Pending],
                Resolved => &[InProgress],
                Rejected => &[Pending],
            },
        }
    }

    /// Whether moving `from` to `to` is allowed.
    pub fn allows(&self, from: GrievanceStatus, to: GrievanceStatus) -> bool {
        self.valid_transitions(from).contains(&to)
    }

    /// Fail with [`LifecycleError::InvalidTransition`] unless allowed.
    pub fn check(&self, from: GrievanceStatus, to: GrievanceStatus) -> Result<(), LifecycleError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition { from, to })
        }
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unrestricted" => Ok(Self::Unrestricted),
            "workflow" => Ok(Self::Workflow),
            other => Err(format!(
                "unknown transition policy \"{other}\" (expected unrestricted or workflow)"
            )),
        }
    }
}
