//! Grievance persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `grievances` and
//! `grievance_comments` tables. Authorization and transition rules are
//! enforced by the lifecycle policy before anything reaches SQL.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use redress_core::{
    Comment, CommentId, Grievance, GrievanceId, GrievanceStatus, PrincipalId, StatusChange,
};
use sqlx::PgPool;

/// Convert a store sequence to the `BIGINT` column type.
fn to_db_id(sequence: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(sequence).map_err(|e| {
        tracing::error!(sequence, "id does not fit in BIGINT");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Serialize a status history slice to JSON for persistence.
fn serialize_status_history(history: &[StatusChange]) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(history).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize grievance status_history");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Insert a newly submitted grievance.
pub async fn insert(pool: &PgPool, grievance: &Grievance) -> Result<(), sqlx::Error> {
    let history = serialize_status_history(&grievance.status_history)?;

    sqlx::query(
        "INSERT INTO grievances (id, title, description, category, status, submitter_id,
                                 submitter_name, assignee_id, status_history, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(to_db_id(grievance.id.sequence())?)
    .bind(&grievance.title)
    .bind(&grievance.description)
    .bind(&grievance.category)
    .bind(grievance.status.as_str())
    .bind(grievance.submitter_id.as_str())
    .bind(&grievance.submitter_name)
    .bind(grievance.assignee_id.as_ref().map(PrincipalId::as_str))
    .bind(&history)
    .bind(grievance.created_at)
    .bind(grievance.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Status history only grows, so a row whose history is already longer than
/// the snapshot being written holds a later status change and must not be
/// overwritten. `updated_at` only moves forward.
const UPDATE_LIFECYCLE: &str = "UPDATE grievances
     SET status = $1, assignee_id = $2, status_history = $3,
         updated_at = GREATEST(updated_at, $4)
     WHERE id = $5 AND jsonb_array_length(status_history) <= $6";

/// Persist status, assignee, history and `updated_at` after a lifecycle change.
///
/// Write-throughs run after the in-memory lock is released and may commit
/// out of order; a snapshot older than the stored row is skipped. Fails with
/// [`sqlx::Error::RowNotFound`] when the row does not exist.
pub async fn update_lifecycle(pool: &PgPool, grievance: &Grievance) -> Result<(), sqlx::Error> {
    let history = serialize_status_history(&grievance.status_history)?;
    let history_len = i32::try_from(grievance.status_history.len())
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let id = to_db_id(grievance.id.sequence())?;

    let result = sqlx::query(UPDATE_LIFECYCLE)
        .bind(grievance.status.as_str())
        .bind(grievance.assignee_id.as_ref().map(PrincipalId::as_str))
        .bind(&history)
        .bind(grievance.updated_at)
        .bind(id)
        .bind(history_len)
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    let row_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM grievances WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    unapplied_update(grievance.id, row_exists)
}

/// Outcome of a lifecycle UPDATE that matched no row.
fn unapplied_update(id: GrievanceId, row_exists: bool) -> Result<(), sqlx::Error> {
    if row_exists {
        tracing::debug!(grievance_id = %id, "newer lifecycle state already persisted, skipping");
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

/// Insert a comment and advance the parent's `updated_at` in one transaction.
pub async fn insert_comment(
    pool: &PgPool,
    grievance_id: GrievanceId,
    comment: &Comment,
) -> Result<(), sqlx::Error> {
    let parent = to_db_id(grievance_id.sequence())?;
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO grievance_comments (id, grievance_id, text, author_id, author_name,
                                         is_admin_comment, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(to_db_id(comment.id.sequence())?)
    .bind(parent)
    .bind(&comment.text)
    .bind(comment.author_id.as_str())
    .bind(&comment.author_name)
    .bind(comment.is_admin_comment)
    .bind(comment.created_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE grievances SET updated_at = GREATEST(updated_at, $1) WHERE id = $2")
        .bind(comment.created_at)
        .bind(parent)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

/// Everything read back from the database at startup.
#[derive(Debug, Default)]
pub struct Hydration {
    /// Records that mapped cleanly, ordered by id, with their threads.
    pub grievances: Vec<Grievance>,
    /// Highest grievance id present in the table, including skipped rows.
    pub last_grievance: Option<GrievanceId>,
    /// Highest comment id present in the table, including skipped rows.
    pub last_comment: Option<CommentId>,
}

/// Load every grievance with its comment thread, ordered by id.
pub async fn load_all(pool: &PgPool) -> Result<Hydration, sqlx::Error> {
    let rows = sqlx::query_as::<_, GrievanceRow>(
        "SELECT id, title, description, category, status, submitter_id, submitter_name,
                assignee_id, status_history, created_at, updated_at
         FROM grievances ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let comment_rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, grievance_id, text, author_id, author_name, is_admin_comment, created_at
         FROM grievance_comments ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(assemble(rows, comment_rows))
}

fn highest_sequence(ids: impl Iterator<Item = i64>) -> Option<u64> {
    ids.max().and_then(|n| u64::try_from(n).ok())
}

fn assemble(rows: Vec<GrievanceRow>, comment_rows: Vec<CommentRow>) -> Hydration {
    let last_grievance =
        highest_sequence(rows.iter().map(|r| r.id)).and_then(GrievanceId::from_sequence);
    let last_comment =
        highest_sequence(comment_rows.iter().map(|r| r.id)).and_then(CommentId::from_sequence);

    let mut threads: HashMap<i64, Vec<Comment>> = HashMap::new();
    for row in comment_rows {
        let parent = row.grievance_id;
        if let Some(comment) = row.into_comment() {
            threads.entry(parent).or_default().push(comment);
        }
    }

    let grievances: Vec<Grievance> = rows
        .into_iter()
        .filter_map(|row| {
            let comments = threads.remove(&row.id).unwrap_or_default();
            row.into_record(comments)
        })
        .collect();

    let orphaned: usize = threads.values().map(Vec::len).sum();
    if orphaned > 0 {
        tracing::warn!(orphaned, "comments whose grievance could not be restored were dropped");
    }

    Hydration {
        grievances,
        last_grievance,
        last_comment,
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct GrievanceRow {
    id: i64,
    title: String,
    description: String,
    category: String,
    status: String,
    submitter_id: String,
    submitter_name: String,
    assignee_id: Option<String>,
    status_history: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GrievanceRow {
    /// Rows whose id or submitter cannot be represented are skipped with an
    /// error log; other malformed columns fall back to safe defaults.
    fn into_record(self, comments: Vec<Comment>) -> Option<Grievance> {
        let Some(id) = u64::try_from(self.id)
            .ok()
            .and_then(GrievanceId::from_sequence)
        else {
            tracing::error!(id = self.id, "invalid grievance id in database, skipping row");
            return None;
        };

        let submitter_id = match PrincipalId::new(&self.submitter_id) {
            Ok(submitter) => submitter,
            Err(e) => {
                tracing::error!(%id, error = %e, "invalid submitter_id in database, skipping row");
                return None;
            }
        };

        let status: GrievanceStatus = self.status.parse().unwrap_or_else(|e| {
            tracing::error!(
                %id,
                status = %self.status,
                error = %e,
                "unknown grievance status in database, defaulting to pending; \
                 investigate: this may indicate data corruption"
            );
            GrievanceStatus::Pending
        });

        let assignee_id = self.assignee_id.and_then(|raw| {
            PrincipalId::new(&raw)
                .map_err(|e| {
                    tracing::warn!(%id, error = %e, "invalid assignee_id in database, clearing");
                })
                .ok()
        });

        let status_history: Vec<StatusChange> = serde_json::from_value(self.status_history)
            .unwrap_or_else(|e| {
                tracing::error!(
                    %id,
                    error = %e,
                    "failed to deserialize status_history, defaulting to empty"
                );
                Vec::new()
            });

        Some(Grievance {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            status,
            submitter_id,
            submitter_name: self.submitter_name,
            assignee_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            comments,
            status_history,
        })
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    grievance_id: i64,
    text: String,
    author_id: String,
    author_name: String,
    is_admin_comment: bool,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Option<Comment> {
        let id = u64::try_from(self.id).ok().and_then(CommentId::from_sequence);
        let author_id = PrincipalId::new(&self.author_id).ok();
        match (id, author_id) {
            (Some(id), Some(author_id)) => Some(Comment {
                id,
                text: self.text,
                author_id,
                author_name: self.author_name,
                is_admin_comment: self.is_admin_comment,
                created_at: self.created_at,
            }),
            _ => {
                tracing::error!(
                    id = self.id,
                    grievance_id = self.grievance_id,
                    "invalid comment row in database, skipping"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redress_core::{NewComment, NewGrievance, Principal, Role};
    use redress_store::{GrievanceStore, MemoryStore};

    fn row(id: i64, status: &str) -> GrievanceRow {
        let now = Utc::now();
        GrievanceRow {
            id,
            title: "Water leak".into(),
            description: "Ceiling drips".into(),
            category: "Service".into(),
            status: status.into(),
            submitter_id: "u1".into(),
            submitter_name: "Uma".into(),
            assignee_id: Some("a1".into()),
            status_history: serde_json::json!([]),
            created_at: now,
            updated_at: now,
        }
    }

    fn comment_row(id: i64, grievance_id: i64) -> CommentRow {
        CommentRow {
            id,
            grievance_id,
            text: "on it".into(),
            author_id: "a1".into(),
            author_name: "Ann".into(),
            is_admin_comment: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_maps_to_record() {
        let g = row(3, "in-progress").into_record(Vec::new()).unwrap();
        assert_eq!(g.id.to_string(), "g3");
        assert_eq!(g.status, GrievanceStatus::InProgress);
        assert_eq!(g.assignee_id.unwrap().as_str(), "a1");
    }

    #[test]
    fn unknown_status_defaults_to_pending() {
        let g = row(1, "archived").into_record(Vec::new()).unwrap();
        assert_eq!(g.status, GrievanceStatus::Pending);
    }

    #[test]
    fn invalid_ids_are_skipped() {
        assert!(row(0, "pending").into_record(Vec::new()).is_none());
        assert!(row(-5, "pending").into_record(Vec::new()).is_none());
    }

    #[test]
    fn malformed_history_defaults_to_empty() {
        let mut r = row(2, "resolved");
        r.status_history = serde_json::json!({"not": "a list"});
        let g = r.into_record(Vec::new()).unwrap();
        assert!(g.status_history.is_empty());
    }

    #[test]
    fn history_round_trips_through_json() {
        let change = StatusChange {
            from: GrievanceStatus::Pending,
            to: GrievanceStatus::Resolved,
            changed_by: PrincipalId::new("a1").unwrap(),
            changed_at: Utc::now(),
        };
        let value = serialize_status_history(std::slice::from_ref(&change)).unwrap();
        let mut r = row(2, "resolved");
        r.status_history = value;
        assert_eq!(r.into_record(Vec::new()).unwrap().status_history, vec![change]);
    }

    #[test]
    fn comment_row_mapping() {
        let good = CommentRow {
            id: 7,
            grievance_id: 1,
            text: "on it".into(),
            author_id: "a1".into(),
            author_name: "Ann".into(),
            is_admin_comment: true,
            created_at: Utc::now(),
        };
        assert_eq!(good.into_comment().unwrap().id.to_string(), "c7");

        let bad = CommentRow {
            id: 0,
            grievance_id: 1,
            text: "x".into(),
            author_id: "a1".into(),
            author_name: "Ann".into(),
            is_admin_comment: false,
            created_at: Utc::now(),
        };
        assert!(bad.into_comment().is_none());
    }

    #[test]
    fn hydration_counts_skipped_rows_toward_id_counters() {
        let mut broken = row(2, "pending");
        broken.submitter_id = "   ".into();
        let hydration = assemble(
            vec![row(1, "pending"), broken],
            vec![comment_row(1, 1), comment_row(3, 2)],
        );

        assert_eq!(hydration.grievances.len(), 1);
        assert_eq!(hydration.grievances[0].comments.len(), 1);
        assert_eq!(hydration.last_grievance, GrievanceId::from_sequence(2));
        assert_eq!(hydration.last_comment, CommentId::from_sequence(3));

        let store = MemoryStore::new();
        for grievance in hydration.grievances {
            store.restore(grievance).unwrap();
        }
        store.advance_ids(hydration.last_grievance, hydration.last_comment);

        let submitter = Principal::new(PrincipalId::new("u1").unwrap(), "Uma", Role::User);
        let fresh = store
            .create(NewGrievance::new("Noise", "Late music", "Service", &submitter).unwrap())
            .unwrap();
        assert_eq!(fresh.id.to_string(), "g3");
        let comment = store
            .append_comment(fresh.id, NewComment::new("ok", &submitter).unwrap())
            .unwrap();
        assert_eq!(comment.id.to_string(), "c4");
    }

    #[test]
    fn empty_tables_hydrate_to_nothing() {
        let hydration = assemble(Vec::new(), Vec::new());
        assert!(hydration.grievances.is_empty());
        assert!(hydration.last_grievance.is_none());
        assert!(hydration.last_comment.is_none());
    }

    #[test]
    fn lifecycle_update_is_guarded_against_stale_snapshots() {
        assert!(UPDATE_LIFECYCLE.contains("jsonb_array_length(status_history) <= $6"));
        assert!(UPDATE_LIFECYCLE.contains("GREATEST(updated_at, $4)"));
    }

    #[test]
    fn unapplied_update_on_existing_row_is_skipped() {
        let id = GrievanceId::from_sequence(5).unwrap();
        assert!(unapplied_update(id, true).is_ok());
    }

    #[test]
    fn unapplied_update_on_missing_row_is_an_error() {
        let id = GrievanceId::from_sequence(5).unwrap();
        assert!(matches!(
            unapplied_update(id, false),
            Err(sqlx::Error::RowNotFound)
        ));
    }
}
