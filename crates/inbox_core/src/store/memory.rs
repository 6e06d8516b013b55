//! In-memory item store.
//!
//! Items live in insertion order inside a `RwLock`; readers clone what they
//! need, so iteration never races a concurrent update.

use crate::model::item::{Item, ItemId};
use crate::store::{mutate_copy, sort_for_display, ItemStore, StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Inner {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

/// Process-local store used by tests and hosts without persistence.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    inner: RwLock<Inner>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl ItemStore for InMemoryItemStore {
    fn append(&self, item: Item) -> StoreResult<ItemId> {
        item.validate()?;

        let mut inner = self.write()?;
        if inner.index.contains_key(&item.id) {
            return Err(StoreError::DuplicateId(item.id));
        }
        let id = item.id;
        let position = inner.items.len();
        inner.items.push(item);
        inner.index.insert(id, position);
        Ok(id)
    }

    fn get(&self, id: ItemId) -> StoreResult<Item> {
        let inner = self.read()?;
        inner
            .index
            .get(&id)
            .map(|&position| inner.items[position].clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn update<F, E>(&self, id: ItemId, mutator: F) -> Result<Item, E>
    where
        F: FnOnce(&mut Item) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut inner = self.write().map_err(E::from)?;
        let position = *inner
            .index
            .get(&id)
            .ok_or_else(|| E::from(StoreError::NotFound(id)))?;

        let updated = mutate_copy(&inner.items[position], mutator)?;
        inner.items[position] = updated.clone();
        Ok(updated)
    }

    fn all(&self) -> StoreResult<Vec<Item>> {
        let mut snapshot = self.read()?.items.clone();
        sort_for_display(&mut snapshot);
        Ok(snapshot)
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.items.len())
    }
}
