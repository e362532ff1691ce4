//! # Store Contract
//!
//! [`GrievanceStore`] is the seam between the lifecycle policy and storage.
//! It is object-safe so the API can hold an `Arc<dyn GrievanceStore>`.

use std::fmt::Debug;

use redress_core::{
    Comment, CommentId, Grievance, GrievanceId, GrievanceStatus, NewComment, NewGrievance, PrincipalId,
};

use crate::error::StoreError;

/// A status change to apply, with the actor recorded in the history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// New status.
    pub to: GrievanceStatus,
    /// Administrator applying it.
    pub changed_by: PrincipalId,
}

/// A partial update applied atomically to one grievance.
///
/// An empty patch still refreshes `updated_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrievancePatch {
    /// New status, if changing.
    pub status: Option<StatusUpdate>,
    /// `Some(None)` clears the assignee, `Some(Some(id))` sets it.
    pub assignee: Option<Option<PrincipalId>>,
    /// Reject with [`StoreError::Conflict`] unless the current status matches.
    pub expected_status: Option<GrievanceStatus>,
}

impl GrievancePatch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status, logging `changed_by` in the history.
    pub fn status(mut self, to: GrievanceStatus, changed_by: PrincipalId) -> Self {
        self.status = Some(StatusUpdate { to, changed_by });
        self
    }

    /// Set or clear the assignee.
    pub fn assignee(mut self, assignee: Option<PrincipalId>) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Guard the patch on the current status.
    pub fn expect_status(mut self, expected: GrievanceStatus) -> Self {
        self.expected_status = Some(expected);
        self
    }
}

/// Keyed collection of grievances and their threads.
///
/// Each method is atomic with respect to a single record and returns
/// copies; no reference into the store ever escapes.
pub trait GrievanceStore: Send + Sync + Debug {
    /// Insert a new grievance with a fresh id, `pending` status and
    /// `created_at == updated_at == now`.
    fn create(&self, input: NewGrievance) -> Result<Grievance, StoreError>;

    /// Copy of one grievance.
    fn get(&self, id: GrievanceId) -> Option<Grievance>;

    /// Every grievance, in creation order.
    fn list(&self) -> Vec<Grievance>;

    /// Grievances filed by `submitter_id`, in creation order.
    fn list_by_submitter(&self, submitter_id: &PrincipalId) -> Vec<Grievance> {
        self.list()
            .into_iter()
            .filter(|g| &g.submitter_id == submitter_id)
            .collect()
    }

    /// Apply `patch` atomically and return the updated copy.
    fn update(&self, id: GrievanceId, patch: GrievancePatch) -> Result<Grievance, StoreError>;

    /// Append a comment with a fresh id and refresh the parent's `updated_at`.
    fn append_comment(&self, id: GrievanceId, comment: NewComment) -> Result<Comment, StoreError>;

    /// Insert an already-persisted record unchanged, advancing id counters
    /// past it and its comments.
    fn restore(&self, grievance: Grievance) -> Result<(), StoreError>;

    /// Move the id counters forward so that fresh ids come after `grievance`
    /// and `comment`. Never moves a counter backwards.
    ///
    /// Used at startup for persisted ids whose records could not be restored.
    fn advance_ids(&self, grievance: Option<GrievanceId>, comment: Option<CommentId>);

    /// Number of grievances held.
    fn len(&self) -> usize;

    /// Whether the store holds no grievances.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
