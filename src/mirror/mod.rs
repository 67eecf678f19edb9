//! Mirror Module
//!
//! Process-local fallback tier for trainer records.
//!
//! ## Responsibilities
//! - Hold every trainer created by this process, whatever the durable store did
//! - Answer reads when the durable store has nothing or is down
//! - Perform the final existence and name re-check of an update together
//!   with the mutation, in one critical section
//! - Remember deleted ids until their durable copy is confirmed gone, so a
//!   recovering durable store cannot bring them back
//!
//! ## Data Structure Choice
//! A `Vec` in insertion order and a `BTreeSet` of tombstones behind one
//! `parking_lot::Mutex`:
//! - Listings come back in the order trainers were created
//! - Every read copies out before the lock is released
//! - No persistence and no eviction; lives as long as its owner

mod table;

pub use table::Mirror;

use crate::model::{Trainer, TrainerId};

/// Result of appending to the mirror
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The trainer is now resident
    Appended,

    /// A trainer with this id was already resident; nothing changed
    DuplicateId,

    /// Another resident trainer already uses this name
    NameTaken(TrainerId),
}

/// Result of applying an update inside the mirror
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The update was applied; carries the trainer as it now stands
    Applied(Trainer),

    /// The target is no longer resident
    Missing,

    /// Another resident trainer already uses the requested name
    NameTaken(TrainerId),
}
