//! # Grievance and Comment Records
//!
//! [`Grievance`] is the stored record. Its fields are public so that storage
//! adapters can rebuild one from persisted rows, but the only way to create a
//! fresh one is through a validated [`NewGrievance`].
//!
//! Text fields are trimmed and bounded at construction:
//!
//! | Field         | Limit (chars) |
//! |---------------|---------------|
//! | `title`       | 200           |
//! | `category`    | 100           |
//! | `description` | 10 000        |
//! | comment text  | 5 000         |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require_text, ValidationError};
use crate::identity::{CommentId, GrievanceId, PrincipalId};
use crate::principal::Principal;
use crate::status::GrievanceStatus;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum category length in characters.
pub const MAX_CATEGORY_LEN: usize = 100;
/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LEN: usize = 10_000;
/// Maximum comment length in characters.
pub const MAX_COMMENT_LEN: usize = 5_000;

/// A complaint and its discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grievance {
    /// Store-assigned identifier. Immutable.
    pub id: GrievanceId,
    /// Short summary.
    pub title: String,
    /// Full complaint text.
    pub description: String,
    /// Free-form category label.
    pub category: String,
    /// Current lifecycle state.
    pub status: GrievanceStatus,
    /// Who filed it. Immutable.
    pub submitter_id: PrincipalId,
    /// Display name of the submitter at filing time. Immutable.
    pub submitter_name: String,
    /// Administrator handling the grievance, if any.
    pub assignee_id: Option<PrincipalId>,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation, never decreases.
    pub updated_at: DateTime<Utc>,
    /// Append-only thread in insertion order.
    pub comments: Vec<Comment>,
    /// Append-only log of accepted status changes.
    pub status_history: Vec<StatusChange>,
}

impl Grievance {
    /// Refresh `updated_at`, keeping it monotonic when the clock steps back.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Rendered id (`g<n>`), matched by free-text search.
    pub fn id_string(&self) -> String {
        self.id.to_string()
    }
}

/// One entry in a grievance thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Store-assigned identifier, unique across all grievances.
    pub id: CommentId,
    /// Trimmed body.
    pub text: String,
    /// Who wrote it.
    pub author_id: PrincipalId,
    /// Display name of the author at write time.
    pub author_name: String,
    /// Whether the author was an admin at write time.
    pub is_admin_comment: bool,
    /// Immutable.
    pub created_at: DateTime<Utc>,
}

/// A recorded status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status before the change.
    pub from: GrievanceStatus,
    /// Status after the change.
    pub to: GrievanceStatus,
    /// Administrator who made the change.
    pub changed_by: PrincipalId,
    /// When it was applied.
    pub changed_at: DateTime<Utc>,
}

/// Validated input for a new grievance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGrievance {
    title: String,
    description: String,
    category: String,
    submitter_id: PrincipalId,
    submitter_name: String,
}

impl NewGrievance {
    /// Validate and trim the submitted fields.
    ///
    /// Fails with [`ValidationError::EmptyField`] or
    /// [`ValidationError::TooLong`]; the submitter must carry a display name.
    pub fn new(
        title: &str,
        description: &str,
        category: &str,
        submitter: &Principal,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: require_text("title", title, MAX_TITLE_LEN)?,
            description: require_text("description", description, MAX_DESCRIPTION_LEN)?,
            category: require_text("category", category, MAX_CATEGORY_LEN)?,
            submitter_id: submitter.id.clone(),
            submitter_name: require_text("submitter_name", &submitter.name, usize::MAX)?,
        })
    }

    /// Trimmed title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Trimmed description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Trimmed category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Submitting principal.
    pub fn submitter_id(&self) -> &PrincipalId {
        &self.submitter_id
    }

    /// Build the stored record: `pending`, no comments, no history.
    pub fn into_grievance(self, id: GrievanceId, now: DateTime<Utc>) -> Grievance {
        Grievance {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            status: GrievanceStatus::Pending,
            submitter_id: self.submitter_id,
            submitter_name: self.submitter_name,
            assignee_id: None,
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
            status_history: Vec::new(),
        }
    }
}

/// Validated input for a new comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    text: String,
    author_id: PrincipalId,
    author_name: String,
    is_admin_comment: bool,
}

impl NewComment {
    /// Validate and trim the text, capturing the author's role now.
    pub fn new(text: &str, author: &Principal) -> Result<Self, ValidationError> {
        Ok(Self {
            text: require_text("text", text, MAX_COMMENT_LEN)?,
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            is_admin_comment: author.is_admin(),
        })
    }

    /// Trimmed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Build the stored comment.
    pub fn into_comment(self, id: CommentId, now: DateTime<Utc>) -> Comment {
        Comment {
            id,
            text: self.text,
            author_id: self.author_id,
            author_name: self.author_name,
            is_admin_comment: self.is_admin_comment,
            created_at: now,
        }
    }
}
