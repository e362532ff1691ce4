#![deny(missing_docs)]

//! # redress-core — Foundational Types for Redress
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies, only `serde`, `thiserror` and `chrono`.
//!
//! ## Design Principles
//!
//! 1. **Newtype identifiers.** [`GrievanceId`] and [`CommentId`] are distinct
//!    sequence-backed types rendered `g<n>` and `c<n>`. You cannot pass one
//!    where the other is expected.
//!
//! 2. **Validated construction.** [`NewGrievance`] and [`NewComment`] can only
//!    be built through constructors that trim and check their text fields, so
//!    a store never sees an empty title or comment.
//!
//! 3. **One identity contract.** [`IdentityProvider`] is the single way the
//!    rest of the system learns who is acting. Token storage is an adapter
//!    concern that lives outside this crate.
//!
//! 4. **[`ValidationError`] hierarchy.** Structured errors with `thiserror`,
//!    no `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod principal;
pub mod record;
pub mod status;

// Re-export primary types at crate root for ergonomic imports.
pub use error::ValidationError;
pub use identity::{CommentId, GrievanceId, PrincipalId};
pub use principal::{IdentityProvider, Principal, Role, StaticIdentity};
pub use record::{Comment, Grievance, NewComment, NewGrievance, StatusChange};
pub use status::GrievanceStatus;
