//! # API Route Modules
//!
//! - `grievances` — submit, list, get, status changes and assignment.
//! - `comments` — the append-only comment thread of a grievance.
//! - `queries` — search, filter, tracking, paging and the dashboard summary.

pub mod comments;
pub mod grievances;
pub mod queries;

use redress_core::GrievanceId;

use crate::error::AppError;

/// Parse a path id such as `g12`.
///
/// A malformed id cannot name an existing grievance, so it is reported as
/// not found rather than as a bad request.
pub(crate) fn parse_grievance_id(raw: &str) -> Result<GrievanceId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("grievance {raw} not found")))
}

/// Map a failed write-through to a 500, logging the underlying error.
pub(crate) fn persist_failed(id: GrievanceId, what: &str, err: sqlx::Error) -> AppError {
    tracing::error!(grievance_id = %id, error = %err, "failed to persist {what} to database");
    AppError::Internal(format!("{what} recorded in-memory but database persist failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_ids() {
        assert_eq!(parse_grievance_id("g4").unwrap().sequence(), 4);
    }

    #[test]
    fn malformed_ids_are_not_found() {
        for raw in ["", "4", "g", "g0", "c4", "g-1", "gx"] {
            assert!(matches!(
                parse_grievance_id(raw),
                Err(AppError::NotFound(_))
            ));
        }
    }

    #[test]
    fn missing_row_on_write_through_is_internal() {
        let id = GrievanceId::from_sequence(2).unwrap();
        let err = persist_failed(id, "status change", sqlx::Error::RowNotFound);
        match err {
            AppError::Internal(msg) => assert!(msg.starts_with("status change")),
            other => panic!("expected Internal, got: {other:?}"),
        }
    }
}
