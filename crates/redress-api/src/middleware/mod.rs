//! # HTTP Middleware
//!
//! - `metrics` — per-request counters recorded through the `metrics` facade.

pub mod metrics;
