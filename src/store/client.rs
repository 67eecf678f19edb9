//! Durable store client
//!
//! Thin adapter over a `DocumentStore` backend. Owns no business logic.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::{Config, StoreBackend};
use crate::model::{Medal, MedalTier, NewTrainer, Trainer, TrainerId};

use super::{DetachedStore, DocumentStore, MemoryStore, StoreResult};

/// Client for the durable tier
///
/// Malformed identifiers never reach the backend: lookups answer `Ok(None)`
/// and mutations answer `Ok(false)`.
#[derive(Clone)]
pub struct StoreClient {
    backend: Arc<dyn DocumentStore>,
}

impl StoreClient {
    /// Wrap an existing backend
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    /// Build the backend selected by the config
    pub fn from_config(config: &Config) -> Self {
        let backend: Arc<dyn DocumentStore> = match config.store_backend {
            StoreBackend::Memory => Arc::new(MemoryStore::with_latency(Duration::from_millis(
                config.store_latency_ms,
            ))),
            StoreBackend::Detached => Arc::new(DetachedStore::new()),
        };
        Self::new(backend)
    }

    /// Look up a trainer by id
    pub fn find_by_id(&self, id: &str) -> StoreResult<Option<Trainer>> {
        let id = match TrainerId::parse(id) {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        self.backend.get(&id)
    }

    /// All trainers whose name contains `fragment`, ignoring case
    pub fn find_by_name(&self, fragment: &str) -> StoreResult<Vec<Trainer>> {
        self.backend.find_name_containing(fragment)
    }

    /// Insert a trainer, stamping `created_at` with the insertion time
    pub fn create(&self, trainer: &Trainer) -> StoreResult<Trainer> {
        let mut document = trainer.clone();
        document.created_at = Utc::now();
        self.backend.insert(document.clone())?;
        Ok(document)
    }

    /// Overwrite a stored trainer; `false` if the id is malformed or unknown
    pub fn replace(&self, trainer: &Trainer) -> StoreResult<bool> {
        if !TrainerId::is_well_formed(trainer.id.as_str()) {
            return Ok(false);
        }
        self.backend.replace(trainer.clone())
    }

    /// Delete a trainer; `false` if the id is malformed or unknown
    pub fn delete(&self, id: &str) -> StoreResult<bool> {
        let id = match TrainerId::parse(id) {
            Ok(id) => id,
            Err(_) => return Ok(false),
        };
        self.backend.remove(&id)
    }

    /// Insert one sample trainer when the store holds no documents
    ///
    /// Returns the seeded trainer, or `None` if the store was not empty.
    pub fn seed_if_empty(&self) -> StoreResult<Option<Trainer>> {
        if self.backend.count()? > 0 {
            return Ok(None);
        }

        let now = Utc::now();
        let sample = NewTrainer::new("test", 20)
            .with_birth_date(now)
            .with_medal(Medal::new("test", MedalTier::Gold));
        let seeded = self.create(&Trainer::from_new(TrainerId::generate(), sample, now))?;
        tracing::info!("Seeded durable store with sample trainer {}", seeded.id);
        Ok(Some(seeded))
    }
}
