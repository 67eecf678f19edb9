//! In-process document store
//!
//! BTreeMap-based stand-in for the external durable store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use crate::model::{name_contains, Trainer, TrainerId};

use super::{DocumentStore, StoreError, StoreResult};

/// Durable store stand-in living in this process
///
/// Documents are keyed by id. Two switches reproduce a misbehaving remote
/// store: `set_available(false)` makes every call fail, and a non-zero
/// latency makes every call sleep before touching the data.
pub struct MemoryStore {
    /// Documents keyed by id
    documents: RwLock<BTreeMap<TrainerId, Trainer>>,

    /// When false every call fails with `Unavailable`
    available: AtomicBool,

    /// Per-call latency in milliseconds
    latency_ms: AtomicU64,
}

impl MemoryStore {
    /// Create an empty, available store with no latency
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Create an empty store that sleeps `latency` on every call
    pub fn with_latency(latency: Duration) -> Self {
        let store = Self::new();
        store.set_latency(latency);
        store
    }

    /// Toggle simulated outage
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Change the simulated per-call latency
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Write a document directly, bypassing availability
    ///
    /// Lets tests plant durable-only or conflicting data.
    pub fn put_raw(&self, trainer: Trainer) {
        self.documents.write().insert(trainer.id.clone(), trainer);
    }

    /// Snapshot of a document, bypassing availability
    pub fn get_raw(&self, id: &TrainerId) -> Option<Trainer> {
        self.documents.read().get(id).cloned()
    }

    /// Sleep for the configured latency, then fail if the store is down
    fn enter(&self) -> StoreResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            std::thread::sleep(Duration::from_millis(latency));
        }
        if !self.is_available() {
            return Err(StoreError::Unavailable(
                "memory store is switched off".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, id: &TrainerId) -> StoreResult<Option<Trainer>> {
        self.enter()?;
        Ok(self.documents.read().get(id).cloned())
    }

    fn find_name_containing(&self, fragment: &str) -> StoreResult<Vec<Trainer>> {
        self.enter()?;
        let documents = self.documents.read();
        Ok(documents
            .values()
            .filter(|trainer| name_contains(&trainer.name, fragment))
            .cloned()
            .collect())
    }

    fn insert(&self, trainer: Trainer) -> StoreResult<()> {
        self.enter()?;
        let mut documents = self.documents.write();
        if documents.contains_key(&trainer.id) {
            return Err(StoreError::Conflict(trainer.id));
        }
        documents.insert(trainer.id.clone(), trainer);
        Ok(())
    }

    fn replace(&self, trainer: Trainer) -> StoreResult<bool> {
        self.enter()?;
        let mut documents = self.documents.write();
        match documents.get_mut(&trainer.id) {
            Some(existing) => {
                *existing = trainer;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, id: &TrainerId) -> StoreResult<bool> {
        self.enter()?;
        Ok(self.documents.write().remove(id).is_some())
    }

    fn count(&self) -> StoreResult<usize> {
        self.enter()?;
        Ok(self.documents.read().len())
    }
}
