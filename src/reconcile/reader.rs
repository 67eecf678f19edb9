//! Reconciliation reader
//!
//! Point and name lookups across both tiers.

use std::sync::Arc;

use crate::mirror::Mirror;
use crate::model::{Trainer, TrainerId};
use crate::store::{StoreClient, StoreResult};

/// Where a point lookup found its trainer
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Found in the durable store
    Durable(Trainer),

    /// Absent from (or unreadable in) the durable store, found in the mirror
    Mirror(Trainer),

    /// Absent from both tiers
    Missing,
}

impl Lookup {
    pub fn into_trainer(self) -> Option<Trainer> {
        match self {
            Lookup::Durable(trainer) | Lookup::Mirror(trainer) => Some(trainer),
            Lookup::Missing => None,
        }
    }
}

/// Merges durable store and mirror results
///
/// Durable copies of ids the mirror has buried are stale: they are dropped
/// from every answer and their durable delete is retried.
#[derive(Clone)]
pub struct Reconciler {
    store: StoreClient,
    mirror: Arc<Mirror>,
}

impl Reconciler {
    pub fn new(store: StoreClient, mirror: Arc<Mirror>) -> Self {
        Self { store, mirror }
    }

    /// Durable copy of a trainer, unless its id is buried
    pub fn durable_copy(&self, id: &TrainerId) -> StoreResult<Option<Trainer>> {
        match self.store.find_by_id(id.as_str())? {
            Some(trainer) if self.mirror.is_buried(&trainer.id) => {
                self.purge(&trainer.id);
                Ok(None)
            }
            found => Ok(found),
        }
    }

    /// Find a trainer by id, durable store first
    pub fn lookup(&self, id: &TrainerId) -> Lookup {
        match self.durable_copy(id) {
            Ok(Some(trainer)) => return Lookup::Durable(trainer),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Durable lookup of {} failed, using mirror: {}", id, e);
            }
        }

        match self.mirror.get(id) {
            Some(trainer) => Lookup::Mirror(trainer),
            None => Lookup::Missing,
        }
    }

    /// Trainers whose name contains `fragment`, ignoring case
    ///
    /// The mirror is only consulted when the durable store returns nothing.
    pub fn list_by_name(&self, fragment: &str) -> Vec<Trainer> {
        match self.store.find_by_name(fragment) {
            Ok(found) => {
                let live = self.drop_buried(found);
                if !live.is_empty() {
                    return live;
                }
            }
            Err(e) => {
                tracing::warn!("Durable name search for '{}' failed, using mirror: {}", fragment, e);
            }
        }

        self.mirror.find_by_name(fragment)
    }

    /// Remove durable hits for buried ids, retrying their delete
    pub fn drop_buried(&self, found: Vec<Trainer>) -> Vec<Trainer> {
        let (buried, live): (Vec<Trainer>, Vec<Trainer>) = found
            .into_iter()
            .partition(|trainer| self.mirror.is_buried(&trainer.id));

        for trainer in &buried {
            self.purge(&trainer.id);
        }
        live
    }

    /// Retry the durable delete of a buried id; the tombstone goes once it lands
    fn purge(&self, id: &TrainerId) {
        match self.store.delete(id.as_str()) {
            Ok(_) => {
                self.mirror.unbury(id);
                tracing::debug!("Purged stale durable copy of deleted trainer {}", id);
            }
            Err(e) => tracing::warn!("Retried durable delete of {} failed: {}", id, e),
        }
    }
}
