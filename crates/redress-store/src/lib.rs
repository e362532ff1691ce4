//! # redress-store — Grievance Storage
//!
//! The store is the single authority for grievance records and their comment
//! threads. Every mutation happens inside one write-lock critical section,
//! and id counters live under the same lock, so concurrent creates can never
//! be handed the same id.
//!
//! Callers only ever receive copies. Authorization is not this crate's job:
//! the lifecycle policy decides who may call what, the store only enforces
//! record-level atomicity and the optional compare-and-set guard on status.
//!
//! ## Implementations
//!
//! - [`MemoryStore`]: `parking_lot::RwLock` over a `BTreeMap`, ordered by id.
//!   Database-backed deployments hydrate it at startup with
//!   [`GrievanceStore::restore`] and write through after each mutation.

pub mod error;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{GrievancePatch, GrievanceStore, StatusUpdate};
