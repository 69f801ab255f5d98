use std::collections::BTreeMap;
use std::sync::RwLock;

use shelflife_core::{Entity, ItemId};
use shelflife_events::{EventBus, InMemoryEventBus, Subscription};
use shelflife_inventory::InventoryItem;
use tracing::warn;

use super::{InventoryRepository, InventorySnapshot, RepositoryError};

type ItemTable = BTreeMap<ItemId, InventoryItem>;

/// In-memory item store.
///
/// Every committed change publishes a fresh [`InventorySnapshot`] while the
/// write lock is still held, so subscribers observe changes in commit order
/// and a new subscriber's initial snapshot is never older than the first
/// change it is notified about.
#[derive(Debug, Default)]
pub struct InMemoryInventoryRepository {
    items: RwLock<ItemTable>,
    bus: InMemoryEventBus<InventorySnapshot>,
}

impl InMemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        let table = items.into_iter().map(|i| (i.id().clone(), i)).collect();
        Self {
            items: RwLock::new(table),
            bus: InMemoryEventBus::new(),
        }
    }

    /// Apply `change` to a copy of the table, run `persist` on the result,
    /// then swap it in and notify subscribers.
    ///
    /// `change` returns whether anything changed; unchanged tables are neither
    /// persisted nor published. If `persist` fails the table is left as it was.
    /// Once the table is swapped the write stands: a failed notification is
    /// logged, not returned.
    pub(crate) fn commit_change<F, P>(&self, change: F, persist: P) -> Result<bool, RepositoryError>
    where
        F: FnOnce(&mut ItemTable) -> bool,
        P: FnOnce(&ItemTable) -> Result<(), RepositoryError>,
    {
        let mut items = self.items.write().map_err(|_| RepositoryError::Poisoned)?;

        let mut next = items.clone();
        if !change(&mut next) {
            return Ok(false);
        }
        persist(&next)?;
        *items = next;

        notify(&self.bus, InventorySnapshot::from_map(&items));
        Ok(true)
    }

    pub(crate) fn put_with<P>(&self, item: InventoryItem, persist: P) -> Result<(), RepositoryError>
    where
        P: FnOnce(&ItemTable) -> Result<(), RepositoryError>,
    {
        self.commit_change(
            |table| {
                if table.get(item.id()) == Some(&item) {
                    return false;
                }
                table.insert(item.id().clone(), item);
                true
            },
            persist,
        )
        .map(|_| ())
    }

    pub(crate) fn delete_with<P>(&self, id: &ItemId, persist: P) -> Result<bool, RepositoryError>
    where
        P: FnOnce(&ItemTable) -> Result<(), RepositoryError>,
    {
        self.commit_change(|table| table.remove(id).is_some(), persist)
    }

    /// Number of live change subscribers (dropped ones are pruned on the next change).
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }
}

/// Publish a committed snapshot. Returns whether subscribers were reached.
fn notify<B>(bus: &B, snapshot: InventorySnapshot) -> bool
where
    B: EventBus<InventorySnapshot>,
{
    match bus.publish(snapshot) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = ?err, "inventory change committed but subscribers were not notified");
            false
        }
    }
}

impl InventoryRepository for InMemoryInventoryRepository {
    fn get_item(&self, id: &ItemId) -> Result<Option<InventoryItem>, RepositoryError> {
        let items = self.items.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(items.get(id).cloned())
    }

    fn put_item(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        self.put_with(item, |_| Ok(()))
    }

    fn delete_item(&self, id: &ItemId) -> Result<bool, RepositoryError> {
        self.delete_with(id, |_| Ok(()))
    }

    fn list_items(&self) -> Result<InventorySnapshot, RepositoryError> {
        let items = self.items.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(InventorySnapshot::from_map(&items))
    }

    fn subscribe(&self) -> Subscription<InventorySnapshot> {
        match self.items.read() {
            Ok(items) => self.bus.subscribe_seeded(InventorySnapshot::from_map(&items)),
            // Poisoned table: still hand out a live subscription, just without a seed.
            Err(_) => self.bus.subscribe(),
        }
    }
}
