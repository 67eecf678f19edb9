//! Mirror implementation
//!
//! Insertion-ordered Vec plus a tombstone set, behind a single Mutex.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::model::{name_contains, names_match, Trainer, TrainerId, UpdateTrainer};

use super::{AppendOutcome, UpdateOutcome};

/// Everything guarded by the mirror's lock
#[derive(Default)]
struct Inner {
    /// Resident trainers in insertion order
    trainers: Vec<Trainer>,

    /// Deleted ids whose durable copy may still exist
    tombstones: BTreeSet<TrainerId>,
}

/// In-memory fallback collection of trainers
///
/// Besides the resident trainers it remembers ids deleted here whose durable
/// delete has not been confirmed. A buried id is never made resident again
/// and readers drop durable hits for it.
pub struct Mirror {
    inner: Mutex<Inner>,
}

impl Mirror {
    /// Create an empty mirror
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Append a trainer unless its id is already resident
    ///
    /// Returns `true` if the trainer was added.
    pub fn append(&self, trainer: Trainer) -> bool {
        self.try_append(trainer, false) == AppendOutcome::Appended
    }

    /// Append a trainer, optionally refusing a case-insensitive name clash
    pub fn try_append(&self, trainer: Trainer, unique_name: bool) -> AppendOutcome {
        let mut inner = self.inner.lock();
        if inner.trainers.iter().any(|t| t.id == trainer.id) {
            return AppendOutcome::DuplicateId;
        }
        if unique_name {
            if let Some(other) = inner
                .trainers
                .iter()
                .find(|t| names_match(&t.name, &trainer.name))
            {
                return AppendOutcome::NameTaken(other.id.clone());
            }
        }
        inner.trainers.push(trainer);
        AppendOutcome::Appended
    }

    /// Make a trainer fetched from the durable store resident
    ///
    /// A copy already resident wins, and a buried id stays deleted; returns
    /// `true` if `trainer` was inserted.
    pub fn hydrate(&self, trainer: Trainer) -> bool {
        let mut inner = self.inner.lock();
        if inner.tombstones.contains(&trainer.id) || inner.trainers.iter().any(|t| t.id == trainer.id) {
            return false;
        }
        inner.trainers.push(trainer);
        true
    }

    /// Remove a trainer by id, returning it if it was resident
    pub fn remove(&self, id: &TrainerId) -> Option<Trainer> {
        let mut inner = self.inner.lock();
        let index = inner.trainers.iter().position(|t| &t.id == id)?;
        Some(inner.trainers.remove(index))
    }

    /// Remove a resident trainer and bury its id in one critical section
    pub fn retire(&self, id: &TrainerId) -> Option<Trainer> {
        let mut inner = self.inner.lock();
        let index = inner.trainers.iter().position(|t| &t.id == id)?;
        inner.tombstones.insert(id.clone());
        Some(inner.trainers.remove(index))
    }

    /// Mark an id as deleted
    pub fn bury(&self, id: &TrainerId) {
        self.inner.lock().tombstones.insert(id.clone());
    }

    /// Forget a tombstone once the durable copy is known to be gone
    pub fn unbury(&self, id: &TrainerId) -> bool {
        self.inner.lock().tombstones.remove(id)
    }

    pub fn is_buried(&self, id: &TrainerId) -> bool {
        self.inner.lock().tombstones.contains(id)
    }

    /// Copy of the trainer with this id
    pub fn get(&self, id: &TrainerId) -> Option<Trainer> {
        self.inner.lock().trainers.iter().find(|t| &t.id == id).cloned()
    }

    pub fn contains(&self, id: &TrainerId) -> bool {
        self.inner.lock().trainers.iter().any(|t| &t.id == id)
    }

    /// Copies of all trainers whose name contains `fragment`, ignoring case
    pub fn find_by_name(&self, fragment: &str) -> Vec<Trainer> {
        self.inner
            .lock()
            .trainers
            .iter()
            .filter(|t| name_contains(&t.name, fragment))
            .cloned()
            .collect()
    }

    /// Id of a resident trainer other than `except` whose name matches `name`
    pub fn name_holder(&self, name: &str, except: &TrainerId) -> Option<TrainerId> {
        self.inner
            .lock()
            .trainers
            .iter()
            .find(|t| &t.id != except && names_match(&t.name, name))
            .map(|t| t.id.clone())
    }

    /// Align a resident trainer's creation time with its durable copy
    ///
    /// Returns `false` if the trainer is no longer resident.
    pub fn sync_created_at(&self, id: &TrainerId, created_at: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock();
        match inner.trainers.iter_mut().find(|t| &t.id == id) {
            Some(trainer) => {
                trainer.created_at = created_at;
                true
            }
            None => false,
        }
    }

    /// Re-check and apply an update in one critical section
    ///
    /// Existence and name uniqueness are checked again here, so anything
    /// learned before the lock was taken is not trusted.
    pub fn apply_update(&self, id: &TrainerId, update: &UpdateTrainer) -> UpdateOutcome {
        let mut inner = self.inner.lock();

        let Some(index) = inner.trainers.iter().position(|t| &t.id == id) else {
            return UpdateOutcome::Missing;
        };

        if let Some(other) = inner
            .trainers
            .iter()
            .find(|t| &t.id != id && names_match(&t.name, &update.name))
        {
            return UpdateOutcome::NameTaken(other.id.clone());
        }

        let target = &mut inner.trainers[index];
        target.apply(update);
        UpdateOutcome::Applied(target.clone())
    }

    /// Copy of every resident trainer in insertion order
    pub fn snapshot(&self) -> Vec<Trainer> {
        self.inner.lock().trainers.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().trainers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().trainers.is_empty()
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}
