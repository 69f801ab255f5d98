//! Single-file JSON store.
//!
//! The file holds one object keyed by item id:
//!
//! ```json
//! { "<item id>": { "id": "<item id>", "name": "...", "category": "cake", "batches": [...] } }
//! ```
//!
//! Every change rewrites the whole file (write to `*.tmp`, then rename).

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use shelflife_core::{Entity, ItemId};
use shelflife_events::Subscription;
use shelflife_inventory::InventoryItem;

use super::in_memory::InMemoryInventoryRepository;
use super::{InventoryRepository, InventorySnapshot, RepositoryError};

#[derive(Debug)]
pub struct JsonFileInventoryRepository {
    path: PathBuf,
    state: InMemoryInventoryRepository,
}

impl JsonFileInventoryRepository {
    /// Load the store at `path`. A missing file is an empty inventory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let items = read_items(&path)?;
        info!(path = %path.display(), items = items.len(), "opened inventory file");

        Ok(Self {
            state: InMemoryInventoryRepository::with_items(items),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<ItemId, InventoryItem>) -> Result<(), RepositoryError> {
        write_items(&self.path, items)?;
        debug!(path = %self.path.display(), items = items.len(), "inventory file written");
        Ok(())
    }
}

impl InventoryRepository for JsonFileInventoryRepository {
    fn get_item(&self, id: &ItemId) -> Result<Option<InventoryItem>, RepositoryError> {
        self.state.get_item(id)
    }

    fn put_item(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        self.state.put_with(item, |items| self.persist(items))
    }

    fn delete_item(&self, id: &ItemId) -> Result<bool, RepositoryError> {
        self.state.delete_with(id, |items| self.persist(items))
    }

    fn list_items(&self) -> Result<InventorySnapshot, RepositoryError> {
        self.state.list_items()
    }

    fn subscribe(&self) -> Subscription<InventorySnapshot> {
        self.state.subscribe()
    }
}

fn read_items(path: &Path) -> Result<Vec<InventoryItem>, RepositoryError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(RepositoryError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let table: BTreeMap<String, InventoryItem> = serde_json::from_str(&raw)?;
    Ok(table
        .into_iter()
        .map(|(key, item)| {
            if key != item.id().as_str() {
                warn!(key = %key, item_id = %item.id(), "inventory entry keyed under a different id; using the item's own id");
            }
            item
        })
        .collect())
}

fn write_items(path: &Path, items: &BTreeMap<ItemId, InventoryItem>) -> Result<(), RepositoryError> {
    let io_err = |source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(items)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shelflife_inventory::Category;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("shelflife-{}", uuid::Uuid::now_v7()))
            .join(name)
    }

    #[test]
    fn missing_file_opens_empty() {
        let repo = JsonFileInventoryRepository::open(temp_path("inventory.json")).unwrap();
        assert!(repo.list_items().unwrap().is_empty());
    }

    #[test]
    fn changes_survive_reopen() {
        let path = temp_path("inventory.json");
        let item = InventoryItem::create("Pineapple cake", Category::PineappleCake)
            .unwrap()
            .intake(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 12)
            .unwrap();

        {
            let repo = JsonFileInventoryRepository::open(&path).unwrap();
            repo.put_item(item.clone()).unwrap();
        }

        let reopened = JsonFileInventoryRepository::open(&path).unwrap();
        assert_eq!(reopened.get_item(item.id()).unwrap(), Some(item.clone()));

        assert!(reopened.delete_item(item.id()).unwrap());
        let again = JsonFileInventoryRepository::open(&path).unwrap();
        assert!(again.list_items().unwrap().is_empty());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn file_is_keyed_by_item_id() {
        let path = temp_path("inventory.json");
        let repo = JsonFileInventoryRepository::open(&path).unwrap();
        let item = InventoryItem::create("Sun cake", Category::Cake).unwrap();
        repo.put_item(item.clone()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[item.id().as_str()]["name"], "Sun cake");
        assert_eq!(raw[item.id().as_str()]["batches"], serde_json::json!([]));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn legacy_entries_without_batches_load_empty() {
        let path = temp_path("inventory.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"old": {"id": "old", "name": "Wife cake", "category": "chinese_pie"}}"#,
        )
        .unwrap();

        let repo = JsonFileInventoryRepository::open(&path).unwrap();
        let item = repo.get_item(&"old".parse().unwrap()).unwrap().unwrap();
        assert!(item.ledger().is_empty());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn entries_with_label_categories_load() {
        let path = temp_path("inventory.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{
                "p1": {"id": "p1", "name": "Pineapple cake", "category": "鳳梨酥類",
                       "batches": [{"id": "b1", "expiryDate": "2025-06-01", "quantity": 5}]},
                "p2": {"id": "p2", "name": "Sun cake", "category": "cake"}
            }"#,
        )
        .unwrap();

        let repo = JsonFileInventoryRepository::open(&path).unwrap();
        let item = repo.get_item(&"p1".parse().unwrap()).unwrap().unwrap();
        assert_eq!(item.category(), Category::PineappleCake);
        assert_eq!(item.total_stock(), 5);
        assert_eq!(repo.list_items().unwrap().len(), 2);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let path = temp_path("inventory.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        match JsonFileInventoryRepository::open(&path).unwrap_err() {
            RepositoryError::Serialization(_) => {}
            other => panic!("Expected Serialization error, got {other:?}"),
        }

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
