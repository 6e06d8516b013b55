//! Item store contracts and hosts.
//!
//! # Responsibility
//! - Define the single source of truth for captured items.
//! - Provide an in-memory host and a SQLite host with identical semantics.
//!
//! # Invariants
//! - Stores are append-only: items are never physically removed.
//! - Every write validates the item before it becomes visible.
//! - `update` is all-or-nothing; readers never observe a half-applied
//!   mutation.
//! - `all()` returns owned snapshots ordered by `created_at` descending,
//!   ties broken by insertion order.

use crate::db::DbError;
use crate::model::item::{Item, ItemId, ItemValidationError};
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryItemStore;
pub use sqlite::SqliteItemStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for item persistence and lookup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(ItemId),
    #[error("item id already present: {0}")]
    DuplicateId(ItemId),
    #[error(transparent)]
    Validation(#[from] ItemValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid persisted item data: {0}")]
    InvalidData(String),
    #[error("connection schema version {actual_version} does not match expected {expected_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table missing: {0}")]
    MissingRequiredTable(&'static str),
    #[error("item store lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for captured items.
///
/// `update` hands the mutator a private copy of the item; the copy replaces
/// the stored item only when the mutator succeeds and the result validates.
/// Identity fields are restored after the mutator runs, so only `status`,
/// `summary` and `tags` can change through this path.
pub trait ItemStore: Send + Sync {
    /// Appends a new item. Fails with `DuplicateId` when the id exists.
    fn append(&self, item: Item) -> StoreResult<ItemId>;

    /// Gets one item by id, including tombstoned ones.
    fn get(&self, id: ItemId) -> StoreResult<Item>;

    /// Applies an in-place mutation atomically and returns the stored result.
    fn update<F, E>(&self, id: ItemId, mutator: F) -> Result<Item, E>
    where
        F: FnOnce(&mut Item) -> Result<(), E>,
        E: From<StoreError>;

    /// Owned snapshot in display order.
    fn all(&self) -> StoreResult<Vec<Item>>;

    fn len(&self) -> StoreResult<usize> {
        Ok(self.all()?.len())
    }

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Runs `mutator` against a copy of `original` and returns the validated copy.
pub(crate) fn mutate_copy<F, E>(original: &Item, mutator: F) -> Result<Item, E>
where
    F: FnOnce(&mut Item) -> Result<(), E>,
    E: From<StoreError>,
{
    let mut candidate = original.clone();
    mutator(&mut candidate)?;
    candidate.restore_immutable_fields(original);
    candidate
        .validate()
        .map_err(|err| E::from(StoreError::Validation(err)))?;
    Ok(candidate)
}

/// Sorts newest first. The sort is stable, so equal timestamps keep the
/// incoming (insertion) order.
pub(crate) fn sort_for_display(items: &mut [Item]) {
    items.sort_by(|left, right| right.created_at.cmp(&left.created_at));
}
