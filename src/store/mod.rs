//! Store Module
//!
//! Client side of the durable document store.
//!
//! ## Responsibilities
//! - Define the `DocumentStore` seam to the external store
//! - Validate identifiers before any backend call
//! - Keep "not found" (`Ok(None)` / `Ok(false)`) apart from store failures
//!
//! ## Backends
//! - `MemoryStore`: in-process stand-in with outage and latency switches
//! - `DetachedStore`: no store wired up, every call fails

mod client;
mod detached;
mod memory;

use thiserror::Error;

use crate::model::{Trainer, TrainerId};

pub use client::StoreClient;
pub use detached::DetachedStore;
pub use memory::MemoryStore;

/// Result type for durable store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by a durable store backend
///
/// "Not found" is never an error here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("durable store unavailable: {0}")]
    Unavailable(String),

    #[error("document {0} already exists")]
    Conflict(TrainerId),
}

/// Operations the external keyed document store offers
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id
    fn get(&self, id: &TrainerId) -> StoreResult<Option<Trainer>>;

    /// All documents whose name contains `fragment`, ignoring case
    fn find_name_containing(&self, fragment: &str) -> StoreResult<Vec<Trainer>>;

    /// Insert a new document; fails with `Conflict` if the id is taken
    fn insert(&self, trainer: Trainer) -> StoreResult<()>;

    /// Overwrite an existing document; `false` if nothing matched
    fn replace(&self, trainer: Trainer) -> StoreResult<bool>;

    /// Remove a document; `false` if nothing matched
    fn remove(&self, id: &TrainerId) -> StoreResult<bool>;

    /// Number of stored documents
    fn count(&self) -> StoreResult<usize>;
}
