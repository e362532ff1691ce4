//! # Query Engine
//!
//! Read-only views over the store. Every query first narrows to the
//! principal's scope (everything for admins, own grievances for users) and
//! then applies its criteria, so a user can never learn about another
//! user's grievance through search, filter, track or the summary counts.

use std::sync::Arc;

use redress_core::{
    Grievance, GrievanceId, GrievanceStatus, Principal, PrincipalId, ValidationError,
};
use redress_store::GrievanceStore;
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::policy::can_view;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Structured filter criteria. Absent fields match everything; present
/// fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GrievanceFilter {
    /// Exact status.
    pub status: Option<GrievanceStatus>,
    /// Exact submitter.
    pub submitter_id: Option<PrincipalId>,
    /// Exact assignee.
    pub assignee_id: Option<PrincipalId>,
}

impl GrievanceFilter {
    fn matches(&self, grievance: &Grievance) -> bool {
        self.status.map_or(true, |s| grievance.status == s)
            && self
                .submitter_id
                .as_ref()
                .map_or(true, |id| &grievance.submitter_id == id)
            && self
                .assignee_id
                .as_ref()
                .map_or(true, |id| grievance.assignee_id.as_ref() == Some(id))
    }
}

/// Count of grievances per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    /// All grievances in scope.
    pub total: usize,
    /// Awaiting triage.
    pub pending: usize,
    /// Being worked on.
    pub in_progress: usize,
    /// Closed with a resolution.
    pub resolved: usize,
    /// Closed without action.
    pub rejected: usize,
}

impl StatusSummary {
    fn record(&mut self, status: GrievanceStatus) {
        self.total += 1;
        match status {
            GrievanceStatus::Pending => self.pending += 1,
            GrievanceStatus::InProgress => self.in_progress += 1,
            GrievanceStatus::Resolved => self.resolved += 1,
            GrievanceStatus::Rejected => self.rejected += 1,
        }
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    /// Page index, starting at zero.
    #[serde(default)]
    pub page: usize,
    /// Items per page, clamped to `1..=100`.
    #[serde(default = "default_page_size")]
    pub size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request, clamping `size` into range.
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }.normalized()
    }

    fn normalized(self) -> Self {
        Self {
            page: self.page,
            size: self.size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Page index, starting at zero.
    pub page: usize,
    /// Effective page size after clamping.
    pub size: usize,
    /// Items across all pages.
    pub total: usize,
    /// Number of pages.
    pub total_pages: usize,
}

/// Search, filter, tracking and dashboard views.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<dyn GrievanceStore>,
}

impl QueryEngine {
    /// Engine reading from `store`.
    pub fn new(store: Arc<dyn GrievanceStore>) -> Self {
        Self { store }
    }

    fn scope(&self, principal: &Principal) -> Vec<Grievance> {
        if principal.is_admin() {
            self.store.list()
        } else {
            self.store.list_by_submitter(&principal.id)
        }
    }

    /// Case-insensitive substring match on title, description or rendered
    /// id. A blank term returns everything in scope.
    pub fn search(&self, principal: &Principal, term: &str) -> Vec<Grievance> {
        let needle = term.trim().to_lowercase();
        let scoped = self.scope(principal);
        if needle.is_empty() {
            return scoped;
        }
        scoped
            .into_iter()
            .filter(|g| {
                g.title.to_lowercase().contains(&needle)
                    || g.description.to_lowercase().contains(&needle)
                    || g.id_string().contains(&needle)
            })
            .collect()
    }

    /// Grievances in scope matching every supplied criterion.
    pub fn filter(&self, principal: &Principal, filter: &GrievanceFilter) -> Vec<Grievance> {
        self.scope(principal)
            .into_iter()
            .filter(|g| filter.matches(g))
            .collect()
    }

    /// Look up a grievance by a user-typed id.
    ///
    /// Blank input is an invalid argument. Malformed, unknown and invisible
    /// ids all report not found.
    pub fn track(&self, principal: &Principal, raw_id: &str) -> Result<Grievance, LifecycleError> {
        let raw = raw_id.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyField { field: "id" }.into());
        }
        let not_found = || LifecycleError::not_found(raw);
        let id: GrievanceId = raw.parse().map_err(|_| not_found())?;
        self.store
            .get(id)
            .filter(|g| can_view(principal, g))
            .ok_or_else(not_found)
    }

    /// Per-status counts over the principal's scope.
    pub fn summary(&self, principal: &Principal) -> StatusSummary {
        self.scope(principal)
            .iter()
            .fold(StatusSummary::default(), |mut summary, g| {
                summary.record(g.status);
                summary
            })
    }

    /// Newest first (`created_at` descending, then id descending).
    pub fn page(&self, principal: &Principal, request: PageRequest) -> Page<Grievance> {
        let request = request.normalized();
        let mut scoped = self.scope(principal);
        scoped.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = scoped.len();
        let items = scoped
            .into_iter()
            .skip(request.page.saturating_mul(request.size))
            .take(request.size)
            .collect();
        Page {
            items,
            page: request.page,
            size: request.size,
            total,
            total_pages: total.div_ceil(request.size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{LifecyclePolicy, SubmitGrievance};
    use redress_core::Role;
    use redress_store::MemoryStore;

    fn principal(id: &str, role: Role) -> Principal {
        Principal::new(PrincipalId::new(id).unwrap(), format!("name-{id}"), role)
    }

    struct Fixture {
        policy: LifecyclePolicy,
        queries: QueryEngine,
        u: Principal,
        v: Principal,
        admin: Principal,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn GrievanceStore> = Arc::new(MemoryStore::new());
        Fixture {
            policy: LifecyclePolicy::new(store.clone()),
            queries: QueryEngine::new(store),
            u: principal("u", Role::User),
            v: principal("v", Role::User),
            admin: principal("a", Role::Admin),
        }
    }

    fn submit(f: &Fixture, by: &Principal, title: &str, description: &str) -> Grievance {
        f.policy
            .submit(
                by,
                &SubmitGrievance {
                    title: title.into(),
                    description: description.into(),
                    category: "Service".into(),
                },
            )
            .unwrap()
    }

    #[test]
    fn search_is_scoped_and_case_insensitive() {
        let f = fixture();
        let g = submit(&f, &f.u, "Water leak", "Ceiling drips");
        submit(&f, &f.v, "Broken lift", "Stuck on floor 3");

        assert_eq!(f.queries.search(&f.admin, "leak"), vec![g.clone()]);
        assert_eq!(f.queries.search(&f.admin, "LEAK"), vec![g.clone()]);
        assert!(f.queries.search(&f.v, "leak").is_empty());
        assert_eq!(f.queries.search(&f.u, "drips"), vec![g]);
    }

    #[test]
    fn search_matches_rendered_id() {
        let f = fixture();
        submit(&f, &f.u, "one", "first");
        let second = submit(&f, &f.u, "two", "second");
        let hits = f.queries.search(&f.admin, "G2");
        assert_eq!(hits, vec![second]);
    }

    #[test]
    fn blank_search_returns_scope() {
        let f = fixture();
        submit(&f, &f.u, "one", "first");
        submit(&f, &f.v, "two", "second");
        assert_eq!(f.queries.search(&f.admin, "   ").len(), 2);
        assert_eq!(f.queries.search(&f.u, "").len(), 1);
    }

    #[test]
    fn filter_combines_criteria() {
        let f = fixture();
        let a = submit(&f, &f.u, "a", "a");
        let b = submit(&f, &f.u, "b", "b");
        submit(&f, &f.v, "c", "c");
        f.policy.change_status(&f.admin, a.id, "resolved").unwrap();
        f.policy.assign(&f.admin, b.id, Some(f.admin.id.clone())).unwrap();

        let resolved = f.queries.filter(
            &f.admin,
            &GrievanceFilter {
                status: Some(GrievanceStatus::Resolved),
                ..Default::default()
            },
        );
        assert_eq!(resolved.iter().map(|g| g.id).collect::<Vec<_>>(), vec![a.id]);

        let by_u_pending = f.queries.filter(
            &f.admin,
            &GrievanceFilter {
                status: Some(GrievanceStatus::Pending),
                submitter_id: Some(f.u.id.clone()),
                assignee_id: None,
            },
        );
        assert_eq!(by_u_pending.iter().map(|g| g.id).collect::<Vec<_>>(), vec![b.id]);

        let assigned = f.queries.filter(
            &f.admin,
            &GrievanceFilter {
                assignee_id: Some(f.admin.id.clone()),
                ..Default::default()
            },
        );
        assert_eq!(assigned.len(), 1);
        assert_eq!(f.queries.filter(&f.admin, &GrievanceFilter::default()).len(), 3);
    }

    #[test]
    fn filter_cannot_escape_scope() {
        let f = fixture();
        submit(&f, &f.u, "a", "a");
        let leaked = f.queries.filter(
            &f.v,
            &GrievanceFilter {
                submitter_id: Some(f.u.id.clone()),
                ..Default::default()
            },
        );
        assert!(leaked.is_empty());
    }

    #[test]
    fn track_trims_and_finds_visible_record() {
        let f = fixture();
        let g = submit(&f, &f.u, "a", "a");
        assert_eq!(f.queries.track(&f.u, "  g1 ").unwrap(), g);
        assert_eq!(f.queries.track(&f.admin, "g1").unwrap(), g);
    }

    #[test]
    fn track_blank_is_invalid_argument() {
        let f = fixture();
        assert_eq!(
            f.queries.track(&f.u, "   "),
            Err(LifecycleError::InvalidArgument(ValidationError::EmptyField {
                field: "id"
            }))
        );
    }

    #[test]
    fn track_malformed_unknown_or_invisible_is_not_found() {
        let f = fixture();
        submit(&f, &f.u, "a", "a");
        for raw in ["nonsense", "g99", "c1"] {
            assert!(
                matches!(f.queries.track(&f.admin, raw), Err(LifecycleError::NotFound(_))),
                "{raw}"
            );
        }
        assert!(matches!(
            f.queries.track(&f.v, "g1"),
            Err(LifecycleError::NotFound(_))
        ));
    }

    #[test]
    fn summary_counts_per_status_in_scope() {
        let f = fixture();
        let a = submit(&f, &f.u, "a", "a");
        let b = submit(&f, &f.u, "b", "b");
        submit(&f, &f.u, "c", "c");
        submit(&f, &f.v, "d", "d");
        f.policy.change_status(&f.admin, a.id, "resolved").unwrap();
        f.policy.change_status(&f.admin, b.id, "in-progress").unwrap();

        assert_eq!(
            f.queries.summary(&f.admin),
            StatusSummary {
                total: 4,
                pending: 2,
                in_progress: 1,
                resolved: 1,
                rejected: 0,
            }
        );
        assert_eq!(f.queries.summary(&f.v).total, 1);
        assert_eq!(f.queries.summary(&f.u).pending, 1);
    }

    #[test]
    fn page_returns_newest_first() {
        let f = fixture();
        for i in 0..5 {
            submit(&f, &f.u, &format!("t{i}"), "d");
        }
        let first = f.queries.page(&f.admin, PageRequest::new(0, 2));
        let titles: Vec<_> = first.items.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, ["t4", "t3"]);
        assert_eq!(first.total, 5);
        assert_eq!(first.total_pages, 3);

        let last = f.queries.page(&f.admin, PageRequest::new(2, 2));
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].title, "t0");

        let beyond = f.queries.page(&f.admin, PageRequest::new(9, 2));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);
    }

    #[test]
    fn page_size_is_clamped() {
        let f = fixture();
        submit(&f, &f.u, "a", "a");
        assert_eq!(f.queries.page(&f.u, PageRequest::new(0, 0)).size, 1);
        assert_eq!(f.queries.page(&f.u, PageRequest::new(0, 5000)).size, MAX_PAGE_SIZE);
        assert_eq!(
            f.queries
                .page(&f.u, PageRequest { page: 0, size: 0 })
                .size,
            1
        );
        assert_eq!(PageRequest::default().size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn page_is_scoped() {
        let f = fixture();
        submit(&f, &f.u, "a", "a");
        submit(&f, &f.v, "b", "b");
        let page = f.queries.page(&f.v, PageRequest::default());
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "b");
    }
}
