//! Trainer service
//!
//! Unary get/delete/update and streaming create/list over both tiers.

use std::sync::Arc;

use chrono::Utc;

use crate::config::Config;
use crate::error::{Result, RosterError};
use crate::mirror::Mirror;
use crate::model::{NewTrainer, Trainer, TrainerId, UpdateTrainer};
use crate::reconcile::{Reconciler, UniquenessGuard};
use crate::store::StoreClient;

use super::{CancelToken, CreateSummary, ListSummary, TrainerSink};

/// The orchestrating record service
///
/// ## Tiers
///
/// - **Durable store**: consulted first wherever it can answer. Every call
///   may fail; failures are logged and absorbed whenever the mirror can
///   stand in.
/// - **Mirror**: receives every created trainer regardless of the durable
///   outcome, and answers reads the durable store cannot.
///
/// ## Concurrency
///
/// Calls run concurrently. The mirror's mutex is the only shared mutable
/// state here, and no durable call is made while it is held. The one window
/// between two critical sections is update's hydrate-then-commit; the commit
/// re-validates existence and name uniqueness instead of trusting the first
/// look.
pub struct TrainerService {
    /// Durable tier
    store: StoreClient,

    /// Fallback tier
    mirror: Arc<Mirror>,

    /// Read-time reconciliation
    reader: Reconciler,

    /// Cross-tier name checks
    guard: UniquenessGuard,

    /// Also check names on create
    unique_names_on_create: bool,
}

impl TrainerService {
    /// Build a service over an existing store client and mirror
    pub fn new(store: StoreClient, mirror: Arc<Mirror>) -> Self {
        Self {
            reader: Reconciler::new(store.clone(), Arc::clone(&mirror)),
            guard: UniquenessGuard::new(store.clone(), Arc::clone(&mirror)),
            store,
            mirror,
            unique_names_on_create: false,
        }
    }

    /// Build the store backend named by the config, seed it if asked, and
    /// wrap it with a fresh mirror
    pub fn open(config: &Config) -> Result<Self> {
        let store = StoreClient::from_config(config);

        if config.seed_store {
            // A store that is down at startup is not fatal
            if let Err(e) = store.seed_if_empty() {
                tracing::warn!("Could not seed durable store: {}", e);
            }
        }

        Ok(Self::new(store, Arc::new(Mirror::new()))
            .with_unique_names_on_create(config.unique_names_on_create))
    }

    /// Enable or disable the name check on create
    pub fn with_unique_names_on_create(mut self, enabled: bool) -> Self {
        self.unique_names_on_create = enabled;
        self
    }

    // =========================================================================
    // Unary Calls
    // =========================================================================

    /// Get a trainer by id
    ///
    /// Durable store first, mirror second.
    pub fn get(&self, id: &str) -> Result<Trainer> {
        let id = TrainerId::parse(id)?;

        self.reader
            .lookup(&id)
            .into_trainer()
            .ok_or_else(|| RosterError::trainer_not_found(id.as_str()))
    }

    /// Delete a trainer by id, returning the removed record
    ///
    /// Steps:
    /// 1. Remove from the mirror, leaving a tombstone
    /// 2. If it was not resident, confirm it exists in the durable store
    /// 3. Delete from the durable store; the tombstone stays until this lands
    pub fn delete(&self, id: &str) -> Result<Trainer> {
        let id = TrainerId::parse(id)?;

        // Step 1: Mirror removal decides the caller-visible outcome
        let removed = match self.mirror.retire(&id) {
            Some(trainer) => trainer,
            None => match self.reader.durable_copy(&id) {
                // Step 2: Durable-only trainer
                Ok(Some(trainer)) => {
                    self.mirror.bury(&id);
                    trainer
                }
                Ok(None) => return Err(RosterError::trainer_not_found(id.as_str())),
                Err(e) => {
                    tracing::warn!("Durable lookup of {} failed during delete: {}", id, e);
                    return Err(RosterError::trainer_not_found(id.as_str()));
                }
            },
        };

        // Step 3: Durable delete; a failure keeps the tombstone for later retries
        match self.store.delete(id.as_str()) {
            Ok(deleted) => {
                self.mirror.unbury(&id);
                if deleted {
                    tracing::debug!("Deleted trainer {} from durable store", id);
                } else {
                    tracing::debug!("Trainer {} was not in the durable store", id);
                }
            }
            Err(e) => tracing::warn!("Durable delete of {} failed, tombstone kept: {}", id, e),
        }

        Ok(removed)
    }

    /// Overwrite a trainer, returning it as it now stands
    ///
    /// Steps:
    /// 1. Validate id, name and age (no I/O before this passes)
    /// 2. Durable name check (store failures skip it)
    /// 3. Make the target resident in the mirror, hydrating from the durable store
    /// 4. Re-check existence and name, then mutate, under the mirror lock
    /// 5. Propagate to the durable store (failures are logged only)
    pub fn update(&self, request: &UpdateTrainer) -> Result<Trainer> {
        // Step 1: Validation
        let id = request.validate()?;

        // Step 2: Durable-tier uniqueness
        self.guard.check_durable(&request.name, Some(&id))?;

        // Step 3: Hydrate
        if !self.mirror.contains(&id) {
            match self.reader.durable_copy(&id) {
                Ok(Some(trainer)) => {
                    if self.mirror.hydrate(trainer) {
                        tracing::debug!("Hydrated trainer {} into mirror", id);
                    }
                }
                Ok(None) => return Err(RosterError::trainer_not_found(id.as_str())),
                Err(e) => {
                    tracing::warn!("Durable lookup of {} failed during update: {}", id, e);
                    return Err(RosterError::trainer_not_found(id.as_str()));
                }
            }
        }

        // Step 4: Commit
        let updated = self.guard.commit_update(&id, request)?;

        // Step 5: Best-effort durable replace
        match self.store.replace(&updated) {
            Ok(true) => tracing::debug!("Replaced trainer {} in durable store", id),
            Ok(false) => tracing::debug!("Trainer {} is mirror-only, durable replace skipped", id),
            Err(e) => tracing::warn!("Durable replace of {} failed: {}", id, e),
        }

        Ok(updated)
    }

    // =========================================================================
    // Streaming Calls
    // =========================================================================

    /// Create trainers from a client stream
    ///
    /// Items are handled one at a time in arrival order. Every accepted
    /// trainer lands in the mirror before the durable store is tried, and a
    /// durable failure does not reject it. Cancellation stops intake; trainers
    /// already accepted stay.
    pub fn create<I>(&self, inputs: I, cancel: &CancelToken) -> CreateSummary
    where
        I: IntoIterator<Item = NewTrainer>,
    {
        let mut accepted = Vec::new();

        for input in inputs {
            if cancel.is_cancelled() {
                tracing::debug!("Create stream cancelled after {} trainers", accepted.len());
                break;
            }

            let trainer = Trainer::from_new(TrainerId::generate(), input, Utc::now());

            if self.unique_names_on_create {
                if let Err(e) = self.guard.check_durable(&trainer.name, Some(&trainer.id)) {
                    tracing::warn!("Skipping create: {}", e);
                    continue;
                }
            }

            match self.guard.admit(trainer.clone(), self.unique_names_on_create) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!("Trainer {} already resident, skipping", trainer.id);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Skipping create: {}", e);
                    continue;
                }
            }

            match self.store.create(&trainer) {
                Ok(stored) => {
                    // The durable insertion time is the creation time in both tiers
                    self.mirror.sync_created_at(&stored.id, stored.created_at);
                    accepted.push(stored);
                }
                Err(e) => {
                    tracing::warn!("Trainer {} kept in mirror only: {}", trainer.id, e);
                    accepted.push(trainer);
                }
            }
        }

        tracing::debug!("Create stream accepted {} trainers", accepted.len());
        CreateSummary {
            success_count: accepted.len(),
            trainers: accepted,
        }
    }

    /// Stream every trainer whose name contains `fragment`, ignoring case
    ///
    /// Cancellation is checked before each item; a sink that fails counts as
    /// cancellation. Neither is an error.
    pub fn list_by_name<S>(&self, fragment: &str, sink: &mut S, cancel: &CancelToken) -> ListSummary
    where
        S: TrainerSink + ?Sized,
    {
        let matches = self.reader.list_by_name(fragment);
        let mut sent = 0;

        for trainer in matches {
            if cancel.is_cancelled() {
                tracing::debug!("Listing '{}' cancelled after {} items", fragment, sent);
                return ListSummary { sent, cancelled: true };
            }
            if let Err(e) = sink.send(trainer) {
                tracing::debug!("Listing '{}' stopped, sink closed: {}", fragment, e);
                return ListSummary { sent, cancelled: true };
            }
            sent += 1;
        }

        ListSummary {
            sent,
            cancelled: false,
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The fallback tier
    pub fn mirror(&self) -> &Arc<Mirror> {
        &self.mirror
    }

    /// The durable tier client
    pub fn store(&self) -> &StoreClient {
        &self.store
    }
}
