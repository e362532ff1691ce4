//! # In-Memory Store
//!
//! All operations are synchronous (the RwLock is `parking_lot`, not
//! `tokio::sync`) because the lock is never held across `.await` points.
//! `parking_lot::RwLock` is non-poisonable, so a panicking writer does not
//! wedge the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use redress_core::{
    Comment, CommentId, Grievance, GrievanceId, NewComment, NewGrievance, StatusChange,
};

use crate::error::StoreError;
use crate::store::{GrievancePatch, GrievanceStore};

#[derive(Debug, Default)]
struct Inner {
    grievances: BTreeMap<GrievanceId, Grievance>,
    last_grievance: Option<GrievanceId>,
    last_comment: Option<CommentId>,
}

impl Inner {
    fn next_grievance_id(&mut self) -> Result<GrievanceId, StoreError> {
        let id = match self.last_grievance {
            None => GrievanceId::first(),
            Some(last) => last.next().ok_or(StoreError::Exhausted { kind: "grievance" })?,
        };
        self.last_grievance = Some(id);
        Ok(id)
    }

    fn next_comment_id(&mut self) -> Result<CommentId, StoreError> {
        let id = match self.last_comment {
            None => CommentId::first(),
            Some(last) => last.next().ok_or(StoreError::Exhausted { kind: "comment" })?,
        };
        self.last_comment = Some(id);
        Ok(id)
    }
}

/// Thread-safe in-memory [`GrievanceStore`].
///
/// Cloning is cheap and yields a handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GrievanceStore for MemoryStore {
    fn create(&self, input: NewGrievance) -> Result<Grievance, StoreError> {
        let mut inner = self.inner.write();
        let id = inner.next_grievance_id()?;
        let grievance = input.into_grievance(id, Utc::now());
        inner.grievances.insert(id, grievance.clone());
        drop(inner);

        tracing::debug!(grievance_id = %id, "grievance stored");
        Ok(grievance)
    }

    fn get(&self, id: GrievanceId) -> Option<Grievance> {
        self.inner.read().grievances.get(&id).cloned()
    }

    fn list(&self) -> Vec<Grievance> {
        self.inner.read().grievances.values().cloned().collect()
    }

    fn update(&self, id: GrievanceId, patch: GrievancePatch) -> Result<Grievance, StoreError> {
        let mut inner = self.inner.write();
        let grievance = inner
            .grievances
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;

        if let Some(expected) = patch.expected_status {
            if grievance.status != expected {
                return Err(StoreError::Conflict {
                    id,
                    expected,
                    actual: grievance.status,
                });
            }
        }

        let now = Utc::now();
        if let Some(update) = patch.status {
            grievance.status_history.push(StatusChange {
                from: grievance.status,
                to: update.to,
                changed_by: update.changed_by,
                changed_at: now,
            });
            grievance.status = update.to;
        }
        if let Some(assignee) = patch.assignee {
            grievance.assignee_id = assignee;
        }
        grievance.touch(now);

        Ok(grievance.clone())
    }

    fn append_comment(&self, id: GrievanceId, comment: NewComment) -> Result<Comment, StoreError> {
        let mut inner = self.inner.write();
        if !inner.grievances.contains_key(&id) {
            return Err(StoreError::NotFound { id });
        }
        let comment_id = inner.next_comment_id()?;
        let now = Utc::now();
        let comment = comment.into_comment(comment_id, now);

        let grievance = inner
            .grievances
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;
        grievance.comments.push(comment.clone());
        grievance.touch(now);
        drop(inner);

        tracing::debug!(grievance_id = %id, comment_id = %comment_id, "comment appended");
        Ok(comment)
    }

    fn restore(&self, grievance: Grievance) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let id = grievance.id;
        if inner.grievances.contains_key(&id) {
            return Err(StoreError::Duplicate { id });
        }

        // Option orders None below Some, so max() also covers an empty store.
        inner.last_grievance = inner.last_grievance.max(Some(id));
        let highest_comment = grievance.comments.iter().map(|c| c.id).max();
        inner.last_comment = inner.last_comment.max(highest_comment);
        inner.grievances.insert(id, grievance);
        Ok(())
    }

    fn advance_ids(&self, grievance: Option<GrievanceId>, comment: Option<CommentId>) {
        let mut inner = self.inner.write();
        inner.last_grievance = inner.last_grievance.max(grievance);
        inner.last_comment = inner.last_comment.max(comment);
    }

    fn len(&self) -> usize {
        self.inner.read().grievances.len()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use redress_core::{GrievanceStatus, Principal, PrincipalId, Role};
    use std::collections::HashSet;

    #[derive(Debug, Clone)]
    enum Op {
        Create,
        Comment(usize),
        SetStatus(usize, GrievanceStatus),
        Assign(usize, bool),
    }

    fn status() -> impl Strategy<Value = GrievanceStatus> {
        prop::sample::select(GrievanceStatus::ALL.to_vec())
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Create),
            any::<usize>().prop_map(Op::Comment),
            (any::<usize>(), status()).prop_map(|(i, s)| Op::SetStatus(i, s)),
            (any::<usize>(), any::<bool>()).prop_map(|(i, b)| Op::Assign(i, b)),
        ]
    }

    fn pick(ids: &[GrievanceId], i: usize) -> Option<GrievanceId> {
        (!ids.is_empty()).then(|| ids[i % ids.len()])
    }

    proptest! {
        /// Whatever the interleaving, grievance and comment ids are never
        /// reused and `updated_at` never decreases.
        #[test]
        fn ids_unique_and_updated_at_monotonic(ops in prop::collection::vec(op(), 1..80)) {
            let store = MemoryStore::new();
            let user = Principal::new(PrincipalId::new("u1").unwrap(), "Uma", Role::User);
            let admin = Principal::new(PrincipalId::new("a1").unwrap(), "Ann", Role::Admin);
            let mut ids: Vec<GrievanceId> = Vec::new();
            let mut comment_ids = HashSet::new();

            for op in ops {
                match op {
                    Op::Create => {
                        let g = store
                            .create(NewGrievance::new("t", "d", "c", &user).unwrap())
                            .unwrap();
                        prop_assert!(!ids.contains(&g.id));
                        ids.push(g.id);
                    }
                    Op::Comment(i) => {
                        if let Some(id) = pick(&ids, i) {
                            let before = store.get(id).unwrap().updated_at;
                            let c = store
                                .append_comment(id, NewComment::new("x", &user).unwrap())
                                .unwrap();
                            prop_assert!(comment_ids.insert(c.id));
                            prop_assert!(store.get(id).unwrap().updated_at >= before);
                        }
                    }
                    Op::SetStatus(i, to) => {
                        if let Some(id) = pick(&ids, i) {
                            let before = store.get(id).unwrap();
                            let after = store
                                .update(id, GrievancePatch::new().status(to, admin.id.clone()))
                                .unwrap();
                            prop_assert!(after.updated_at >= before.updated_at);
                            prop_assert_eq!(
                                after.status_history.len(),
                                before.status_history.len() + 1
                            );
                        }
                    }
                    Op::Assign(i, set) => {
                        if let Some(id) = pick(&ids, i) {
                            let before = store.get(id).unwrap().updated_at;
                            let assignee = set.then(|| admin.id.clone());
                            let after = store
                                .update(id, GrievancePatch::new().assignee(assignee))
                                .unwrap();
                            prop_assert!(after.updated_at >= before);
                        }
                    }
                }
            }
            prop_assert_eq!(store.len(), ids.len());
        }
    }
}
