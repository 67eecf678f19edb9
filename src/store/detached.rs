//! Detached store
//!
//! Stands in for a durable store that is not wired up yet.

use crate::model::{Trainer, TrainerId};

use super::{DocumentStore, StoreError, StoreResult};

/// Backend that fails every call with `StoreError::Unavailable`
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedStore;

impl DetachedStore {
    pub fn new() -> Self {
        Self
    }

    fn unavailable<T>() -> StoreResult<T> {
        Err(StoreError::Unavailable("no durable store configured".to_string()))
    }
}

impl DocumentStore for DetachedStore {
    fn get(&self, _id: &TrainerId) -> StoreResult<Option<Trainer>> {
        Self::unavailable()
    }

    fn find_name_containing(&self, _fragment: &str) -> StoreResult<Vec<Trainer>> {
        Self::unavailable()
    }

    fn insert(&self, _trainer: Trainer) -> StoreResult<()> {
        Self::unavailable()
    }

    fn replace(&self, _trainer: Trainer) -> StoreResult<bool> {
        Self::unavailable()
    }

    fn remove(&self, _id: &TrainerId) -> StoreResult<bool> {
        Self::unavailable()
    }

    fn count(&self) -> StoreResult<usize> {
        Self::unavailable()
    }
}
