//! Uniqueness guard
//!
//! No two live trainers may share a name, ignoring case. The constraint is
//! not enforced by either tier, so it is re-checked on every mutation.

use std::sync::Arc;

use crate::error::{Result, RosterError};
use crate::mirror::{AppendOutcome, Mirror, UpdateOutcome};
use crate::model::{names_match, Trainer, TrainerId, UpdateTrainer};
use crate::store::StoreClient;

/// Cross-tier name uniqueness checks
#[derive(Clone)]
pub struct UniquenessGuard {
    store: StoreClient,
    mirror: Arc<Mirror>,
}

impl UniquenessGuard {
    pub fn new(store: StoreClient, mirror: Arc<Mirror>) -> Self {
        Self { store, mirror }
    }

    /// Durable-tier check: does a trainer other than `id` already use `name`?
    ///
    /// Store failures are logged and treated as "no clash"; the mirror
    /// re-check under the mutation lock still applies afterwards.
    pub fn check_durable(&self, name: &str, id: Option<&TrainerId>) -> Result<()> {
        let candidates = match self.store.find_by_name(name) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Durable uniqueness check for '{}' skipped: {}", name, e);
                return Ok(());
            }
        };

        // Deleted trainers still waiting on their durable delete hold no name
        let clash = candidates.iter().any(|t| {
            Some(&t.id) != id && names_match(&t.name, name) && !self.mirror.is_buried(&t.id)
        });
        if clash {
            return Err(RosterError::name_taken(name));
        }
        Ok(())
    }

    /// Mirror-side re-check and mutation of an update, in one critical section
    pub fn commit_update(&self, id: &TrainerId, update: &UpdateTrainer) -> Result<Trainer> {
        match self.mirror.apply_update(id, update) {
            UpdateOutcome::Applied(trainer) => Ok(trainer),
            UpdateOutcome::Missing => Err(RosterError::trainer_not_found(id.as_str())),
            UpdateOutcome::NameTaken(holder) => {
                tracing::debug!("Update of {} rejected, name held by {}", id, holder);
                Err(RosterError::name_taken(&update.name))
            }
        }
    }

    /// Put a newly built trainer into the mirror
    ///
    /// `Ok(false)` means the id was already resident and nothing changed.
    /// With `unique_name` set, a resident name clash is `AlreadyExists`.
    pub fn admit(&self, trainer: Trainer, unique_name: bool) -> Result<bool> {
        let name = trainer.name.clone();
        match self.mirror.try_append(trainer, unique_name) {
            AppendOutcome::Appended => Ok(true),
            AppendOutcome::DuplicateId => Ok(false),
            AppendOutcome::NameTaken(_) => Err(RosterError::name_taken(&name)),
        }
    }
}
