//! Store errors.

use redress_core::{GrievanceId, GrievanceStatus};
use thiserror::Error;

/// Failures reported by a [`GrievanceStore`](crate::GrievanceStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No grievance with this id.
    #[error("grievance {id} not found")]
    NotFound {
        /// The missing id.
        id: GrievanceId,
    },

    /// The compare-and-set guard on status did not hold.
    #[error("grievance {id} status is {actual}, expected {expected}")]
    Conflict {
        /// Target grievance.
        id: GrievanceId,
        /// Status the caller read before deciding.
        expected: GrievanceStatus,
        /// Status found under the write lock.
        actual: GrievanceStatus,
    },

    /// The id sequence has no successor left to hand out.
    #[error("{kind} id sequence exhausted")]
    Exhausted {
        /// `"grievance"` or `"comment"`.
        kind: &'static str,
    },

    /// A restored record collides with an existing id.
    #[error("grievance {id} already exists")]
    Duplicate {
        /// The colliding id.
        id: GrievanceId,
    },
}
