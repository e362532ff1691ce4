//! # Lifecycle Errors
//!
//! Every failure a policy or query operation can report. The HTTP layer maps
//! these one-to-one onto status codes.

use redress_core::{GrievanceStatus, ValidationError};
use redress_store::StoreError;
use thiserror::Error;

/// Errors from lifecycle and query operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The grievance does not exist, or the caller may not see it.
    #[error("{0}")]
    NotFound(String),

    /// The caller's role does not permit the operation.
    #[error("{0}")]
    Forbidden(String),

    /// An input failed validation.
    #[error(transparent)]
    InvalidArgument(#[from] ValidationError),

    /// The configured transition policy does not allow this move.
    #[error("transition from {from} to {to} is not allowed")]
    InvalidTransition {
        /// Current status.
        from: GrievanceStatus,
        /// Requested status.
        to: GrievanceStatus,
    },

    /// The record changed between read and write.
    #[error("{0}")]
    Conflict(String),

    /// The store cannot take the write at all.
    #[error("{0}")]
    Storage(String),
}

impl LifecycleError {
    pub(crate) fn not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("grievance {id} not found"))
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => Self::not_found(id),
            other @ (StoreError::Conflict { .. } | StoreError::Duplicate { .. }) => {
                Self::Conflict(other.to_string())
            }
            other @ StoreError::Exhausted { .. } => Self::Storage(other.to_string()),
        }
    }
}
