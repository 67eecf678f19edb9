//! Model Module
//!
//! Domain entities shared by every tier.
//!
//! ## Contents
//! - `Trainer`: the record kept in both the durable store and the mirror
//! - `Medal` / `MedalTier`: the tagged sub-records a trainer carries
//! - `TrainerId`: validated, immutable identifier
//! - `NewTrainer` / `UpdateTrainer`: inbound shapes for create and update

mod trainer;

pub use trainer::{Medal, MedalTier, NewTrainer, Trainer, TrainerId, UpdateTrainer, MIN_UPDATE_AGE};

/// Case-insensitive name equality used by the uniqueness checks
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive substring test used by name listings
pub fn name_contains(name: &str, fragment: &str) -> bool {
    name.to_lowercase().contains(&fragment.to_lowercase())
}
