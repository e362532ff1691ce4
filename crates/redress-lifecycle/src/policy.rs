//! # Lifecycle Policy
//!
//! Authorization and validity checks in front of every store mutation.
//!
//! Checks run in a fixed order so callers get the most useful error:
//! role gate first, then argument parsing, then existence and visibility,
//! then the transition rule. A denied status change never touches the store.

use std::sync::Arc;

use redress_core::{
    Comment, Grievance, GrievanceId, GrievanceStatus, NewComment, NewGrievance, Principal,
    PrincipalId, Role,
};
use redress_store::{GrievancePatch, GrievanceStore};

use crate::error::LifecycleError;
use crate::transition::TransitionPolicy;

/// Fields a user supplies when filing a grievance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitGrievance {
    /// Short summary.
    pub title: String,
    /// Full complaint text.
    pub description: String,
    /// Category label.
    pub category: String,
}

/// Whether `principal` may see `grievance`: admins see everything, users see
/// what they filed.
pub fn can_view(principal: &Principal, grievance: &Grievance) -> bool {
    principal.is_admin() || principal.id == grievance.submitter_id
}

/// Gatekeeper for grievance mutations and visibility-checked reads.
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    store: Arc<dyn GrievanceStore>,
    transitions: TransitionPolicy,
}

impl LifecyclePolicy {
    /// Policy over `store` with the default [`TransitionPolicy`].
    pub fn new(store: Arc<dyn GrievanceStore>) -> Self {
        Self {
            store,
            transitions: TransitionPolicy::default(),
        }
    }

    /// Replace the transition rules.
    pub fn with_transition_policy(mut self, transitions: TransitionPolicy) -> Self {
        self.transitions = transitions;
        self
    }

    /// Active transition rules.
    pub fn transition_policy(&self) -> TransitionPolicy {
        self.transitions
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn GrievanceStore> {
        &self.store
    }

    /// File a new grievance. Only users may submit.
    pub fn submit(
        &self,
        principal: &Principal,
        fields: &SubmitGrievance,
    ) -> Result<Grievance, LifecycleError> {
        if principal.role != Role::User {
            return Err(LifecycleError::Forbidden(
                "only users may submit grievances".into(),
            ));
        }
        let input = NewGrievance::new(
            &fields.title,
            &fields.description,
            &fields.category,
            principal,
        )?;
        let grievance = self.store.create(input)?;

        tracing::info!(
            grievance_id = %grievance.id,
            submitter = %principal.id,
            category = %grievance.category,
            "grievance submitted"
        );
        Ok(grievance)
    }

    /// Visibility-checked read. A record the caller may not see is reported
    /// as not found.
    pub fn get(&self, principal: &Principal, id: GrievanceId) -> Result<Grievance, LifecycleError> {
        self.store
            .get(id)
            .filter(|g| can_view(principal, g))
            .ok_or_else(|| LifecycleError::not_found(id))
    }

    /// Everything for admins, own grievances for users. Creation order.
    pub fn list(&self, principal: &Principal) -> Vec<Grievance> {
        if principal.is_admin() {
            self.store.list()
        } else {
            self.store.list_by_submitter(&principal.id)
        }
    }

    /// Move a grievance to `new_status`. Admin only.
    ///
    /// The status read for the transition check is re-verified under the
    /// store's write lock, so a concurrent change surfaces as
    /// [`LifecycleError::Conflict`] instead of being silently overwritten.
    pub fn change_status(
        &self,
        principal: &Principal,
        id: GrievanceId,
        new_status: &str,
    ) -> Result<Grievance, LifecycleError> {
        if !principal.is_admin() {
            tracing::warn!(
                grievance_id = %id,
                principal = %principal.id,
                "non-admin status change rejected"
            );
            return Err(LifecycleError::Forbidden(
                "only admins may change grievance status".into(),
            ));
        }
        let to: GrievanceStatus = new_status.parse()?;
        let current = self
            .store
            .get(id)
            .ok_or_else(|| LifecycleError::not_found(id))?;
        self.transitions.check(current.status, to)?;

        let updated = self.store.update(
            id,
            GrievancePatch::new()
                .status(to, principal.id.clone())
                .expect_status(current.status),
        )?;

        tracing::info!(
            grievance_id = %id,
            from = %current.status,
            to = %to,
            admin = %principal.id,
            "grievance status changed"
        );
        Ok(updated)
    }

    /// Set or clear the administrator handling a grievance. Admin only.
    pub fn assign(
        &self,
        principal: &Principal,
        id: GrievanceId,
        assignee: Option<PrincipalId>,
    ) -> Result<Grievance, LifecycleError> {
        if !principal.is_admin() {
            return Err(LifecycleError::Forbidden(
                "only admins may assign grievances".into(),
            ));
        }
        let updated = self
            .store
            .update(id, GrievancePatch::new().assignee(assignee))?;

        tracing::info!(
            grievance_id = %id,
            assignee = ?updated.assignee_id.as_ref().map(PrincipalId::as_str),
            admin = %principal.id,
            "grievance assignment changed"
        );
        Ok(updated)
    }

    /// Append a comment. Anyone who can view the grievance may comment.
    pub fn add_comment(
        &self,
        principal: &Principal,
        id: GrievanceId,
        text: &str,
    ) -> Result<Comment, LifecycleError> {
        let grievance = self
            .store
            .get(id)
            .ok_or_else(|| LifecycleError::not_found(id))?;
        if !can_view(principal, &grievance) {
            return Err(LifecycleError::Forbidden(
                "only the submitter or an admin may comment on this grievance".into(),
            ));
        }
        let comment = NewComment::new(text, principal)?;
        let comment = self.store.append_comment(id, comment)?;

        tracing::info!(
            grievance_id = %id,
            comment_id = %comment.id,
            author = %principal.id,
            admin_comment = comment.is_admin_comment,
            "comment added"
        );
        Ok(comment)
    }

    /// The comment thread of a visible grievance, oldest first.
    pub fn comments(
        &self,
        principal: &Principal,
        id: GrievanceId,
    ) -> Result<Vec<Comment>, LifecycleError> {
        Ok(self.get(principal, id)?.comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redress_core::ValidationError;
    use redress_store::MemoryStore;

    fn principal(id: &str, role: Role) -> Principal {
        Principal::new(PrincipalId::new(id).unwrap(), format!("name-{id}"), role)
    }

    fn user_u() -> Principal {
        principal("u", Role::User)
    }

    fn user_v() -> Principal {
        principal("v", Role::User)
    }

    fn admin() -> Principal {
        principal("a", Role::Admin)
    }

    fn policy() -> LifecyclePolicy {
        LifecyclePolicy::new(Arc::new(MemoryStore::new()))
    }

    fn water_leak() -> SubmitGrievance {
        SubmitGrievance {
            title: "Water leak".into(),
            description: "Ceiling drips in room 4".into(),
            category: "Service".into(),
        }
    }

    #[test]
    fn submit_creates_pending_record_visible_to_owner() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert_eq!(g.status, GrievanceStatus::Pending);
        assert!(g.comments.is_empty());
        assert_eq!(g.submitter_name, "name-u");

        let listed = p.list(&user_u());
        assert_eq!(listed, vec![g]);
    }

    #[test]
    fn admin_cannot_submit() {
        let p = policy();
        assert!(matches!(
            p.submit(&admin(), &water_leak()),
            Err(LifecycleError::Forbidden(_))
        ));
        assert!(p.store().is_empty());
    }

    #[test]
    fn submit_rejects_blank_fields() {
        let p = policy();
        let mut fields = water_leak();
        fields.title = "   ".into();
        assert_eq!(
            p.submit(&user_u(), &fields),
            Err(LifecycleError::InvalidArgument(ValidationError::EmptyField {
                field: "title"
            }))
        );
        assert!(p.store().is_empty());
    }

    #[test]
    fn admin_changes_status_and_owner_sees_it() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        let updated = p.change_status(&admin(), g.id, "resolved").unwrap();
        assert_eq!(updated.status, GrievanceStatus::Resolved);
        assert_eq!(p.get(&user_u(), g.id).unwrap().status, GrievanceStatus::Resolved);
        assert_eq!(updated.status_history.len(), 1);
        assert_eq!(updated.status_history[0].changed_by, admin().id);
    }

    #[test]
    fn non_admin_status_change_fails_loudly() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        let before = p.get(&user_u(), g.id).unwrap();

        let err = p.change_status(&user_u(), g.id, "resolved").unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
        assert_eq!(p.get(&user_u(), g.id).unwrap(), before);
    }

    #[test]
    fn role_gate_runs_before_argument_parsing() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert!(matches!(
            p.change_status(&user_u(), g.id, "bogus"),
            Err(LifecycleError::Forbidden(_))
        ));
    }

    #[test]
    fn unknown_status_name_is_invalid_argument() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert_eq!(
            p.change_status(&admin(), g.id, "closed"),
            Err(LifecycleError::InvalidArgument(ValidationError::UnknownStatus(
                "closed".into()
            )))
        );
    }

    #[test]
    fn change_status_unknown_id_is_not_found() {
        let p = policy();
        let id = GrievanceId::from_sequence(77).unwrap();
        assert!(matches!(
            p.change_status(&admin(), id, "resolved"),
            Err(LifecycleError::NotFound(_))
        ));
    }

    #[test]
    fn unrestricted_allows_reapplying_current_status() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        let same = p.change_status(&admin(), g.id, "pending").unwrap();
        assert_eq!(same.status, GrievanceStatus::Pending);
        assert_eq!(same.status_history.len(), 1);
        assert!(same.updated_at >= g.updated_at);
    }

    #[test]
    fn unrestricted_allows_reopening_resolved() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        p.change_status(&admin(), g.id, "resolved").unwrap();
        let reopened = p.change_status(&admin(), g.id, "pending").unwrap();
        assert_eq!(reopened.status, GrievanceStatus::Pending);
    }

    #[test]
    fn workflow_policy_enforces_graph() {
        let p = policy().with_transition_policy(TransitionPolicy::Workflow);
        assert_eq!(p.transition_policy(), TransitionPolicy::Workflow);
        let g = p.submit(&user_u(), &water_leak()).unwrap();

        assert_eq!(
            p.change_status(&admin(), g.id, "resolved"),
            Err(LifecycleError::InvalidTransition {
                from: GrievanceStatus::Pending,
                to: GrievanceStatus::Resolved,
            })
        );
        assert_eq!(p.get(&admin(), g.id).unwrap().status, GrievanceStatus::Pending);

        p.change_status(&admin(), g.id, "in-progress").unwrap();
        let done = p.change_status(&admin(), g.id, "resolved").unwrap();
        assert_eq!(done.status, GrievanceStatus::Resolved);
        assert_eq!(done.status_history.len(), 2);
    }

    #[test]
    fn non_owner_get_is_not_found() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert!(matches!(
            p.get(&user_v(), g.id),
            Err(LifecycleError::NotFound(_))
        ));
        assert!(p.get(&admin(), g.id).is_ok());
    }

    #[test]
    fn list_scopes_by_role() {
        let p = policy();
        p.submit(&user_u(), &water_leak()).unwrap();
        p.submit(&user_v(), &water_leak()).unwrap();
        assert_eq!(p.list(&user_u()).len(), 1);
        assert_eq!(p.list(&user_v()).len(), 1);
        assert_eq!(p.list(&admin()).len(), 2);
    }

    #[test]
    fn empty_admin_comment_is_invalid_and_thread_unchanged() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert_eq!(
            p.add_comment(&admin(), g.id, ""),
            Err(LifecycleError::InvalidArgument(ValidationError::EmptyField {
                field: "text"
            }))
        );
        assert!(p.get(&admin(), g.id).unwrap().comments.is_empty());
    }

    #[test]
    fn owner_and_admin_can_comment() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        let c1 = p.add_comment(&user_u(), g.id, "any news?").unwrap();
        let c2 = p.add_comment(&admin(), g.id, "  plumber booked  ").unwrap();
        assert!(!c1.is_admin_comment);
        assert!(c2.is_admin_comment);
        assert_eq!(c2.text, "plumber booked");

        let thread = p.comments(&user_u(), g.id).unwrap();
        assert_eq!(thread, vec![c1, c2]);
    }

    #[test]
    fn stranger_cannot_comment() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert!(matches!(
            p.add_comment(&user_v(), g.id, "me too"),
            Err(LifecycleError::Forbidden(_))
        ));
        assert!(p.get(&admin(), g.id).unwrap().comments.is_empty());
    }

    #[test]
    fn comment_on_unknown_grievance_is_not_found() {
        let p = policy();
        let id = GrievanceId::from_sequence(5).unwrap();
        assert!(matches!(
            p.add_comment(&admin(), id, "hello"),
            Err(LifecycleError::NotFound(_))
        ));
    }

    #[test]
    fn stranger_cannot_read_comments() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert!(matches!(
            p.comments(&user_v(), g.id),
            Err(LifecycleError::NotFound(_))
        ));
    }

    #[test]
    fn assign_is_admin_only() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert!(matches!(
            p.assign(&user_u(), g.id, Some(user_u().id)),
            Err(LifecycleError::Forbidden(_))
        ));

        let assigned = p.assign(&admin(), g.id, Some(admin().id)).unwrap();
        assert_eq!(assigned.assignee_id, Some(admin().id));
        assert_eq!(assigned.status, GrievanceStatus::Pending);

        let cleared = p.assign(&admin(), g.id, None).unwrap();
        assert_eq!(cleared.assignee_id, None);
    }

    #[test]
    fn can_view_predicate() {
        let p = policy();
        let g = p.submit(&user_u(), &water_leak()).unwrap();
        assert!(can_view(&user_u(), &g));
        assert!(can_view(&admin(), &g));
        assert!(!can_view(&user_v(), &g));
    }
}
