//! # redress-lifecycle — Grievance Policy and Queries
//!
//! Two components sit between an authenticated [`Principal`] and the
//! [`GrievanceStore`]:
//!
//! - [`LifecyclePolicy`] checks authorization and validity before every
//!   mutation and owns the visibility predicate [`can_view`].
//! - [`QueryEngine`] answers read-only questions (search, filter, track,
//!   summary, paging) scoped to what the principal may see.
//!
//! | Operation       | Gate                           |
//! |-----------------|--------------------------------|
//! | submit          | user                           |
//! | get / track     | admin, or owner                |
//! | list / search   | admin sees all; user sees own  |
//! | change status   | admin                          |
//! | assign          | admin                          |
//! | add comment     | admin, or owner                |
//!
//! Records a principal may not see are reported as not found, so their
//! existence is never leaked.
//!
//! [`Principal`]: redress_core::Principal
//! [`GrievanceStore`]: redress_store::GrievanceStore

pub mod error;
pub mod policy;
pub mod query;
pub mod transition;

pub use error::LifecycleError;
pub use policy::{can_view, LifecyclePolicy, SubmitGrievance};
pub use query::{
    GrievanceFilter, Page, PageRequest, QueryEngine, StatusSummary, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use transition::TransitionPolicy;
