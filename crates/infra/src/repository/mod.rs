//! Item storage boundary.
//!
//! The domain never talks to storage directly: the service reads a snapshot,
//! computes a new item value, and hands the whole item back through this
//! contract (read-modify-write, last write wins).

pub mod in_memory;
pub mod json_file;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use shelflife_core::{Entity, ItemId};
use shelflife_events::Subscription;
use shelflife_inventory::InventoryItem;

pub use in_memory::InMemoryInventoryRepository;
pub use json_file::JsonFileInventoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode inventory data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("repository lock poisoned")]
    Poisoned,
}

/// Immutable view of the whole item collection at one point in time.
///
/// Cheap to clone; every subscriber shares the same allocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InventorySnapshot {
    items: Arc<[InventoryItem]>,
}

impl InventorySnapshot {
    pub(crate) fn from_map(items: &BTreeMap<ItemId, InventoryItem>) -> Self {
        Self {
            items: items.values().cloned().collect(),
        }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Key-value store of whole items, keyed by item id, with change notification.
pub trait InventoryRepository: Send + Sync {
    fn get_item(&self, id: &ItemId) -> Result<Option<InventoryItem>, RepositoryError>;

    /// Whole-item overwrite (insert if absent).
    fn put_item(&self, item: InventoryItem) -> Result<(), RepositoryError>;

    /// Remove an item together with its ledger. Returns whether it existed.
    fn delete_item(&self, id: &ItemId) -> Result<bool, RepositoryError>;

    fn list_items(&self) -> Result<InventorySnapshot, RepositoryError>;

    /// Subscribe to collection changes.
    ///
    /// The first message is the current snapshot; every committed change
    /// produces another. Dropping the subscription unsubscribes.
    fn subscribe(&self) -> Subscription<InventorySnapshot>;
}

impl<R> InventoryRepository for Arc<R>
where
    R: InventoryRepository + ?Sized,
{
    fn get_item(&self, id: &ItemId) -> Result<Option<InventoryItem>, RepositoryError> {
        (**self).get_item(id)
    }

    fn put_item(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        (**self).put_item(item)
    }

    fn delete_item(&self, id: &ItemId) -> Result<bool, RepositoryError> {
        (**self).delete_item(id)
    }

    fn list_items(&self) -> Result<InventorySnapshot, RepositoryError> {
        (**self).list_items()
    }

    fn subscribe(&self) -> Subscription<InventorySnapshot> {
        (**self).subscribe()
    }
}
