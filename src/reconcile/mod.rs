//! Reconcile Module
//!
//! Read-time policy across the durable store and the mirror, and the
//! cross-tier name uniqueness checks.
//!
//! ## Read Priority
//! - Point lookups: durable store, then mirror. A mirror hit never overrides
//!   a durable hit for the same id.
//! - Name listings: one tier wins wholly. A non-empty durable result is used
//!   as is; otherwise the mirror's matches are.

mod guard;
mod reader;

pub use guard::UniquenessGuard;
pub use reader::{Lookup, Reconciler};
