//! Infrastructure layer: storage adapters, application service, config.

pub mod config;
pub mod repository;
pub mod service;
pub mod workers;


pub use config::{AlertSettings, ShelflifeConfig, StoreSettings};
pub use repository::{
    InMemoryInventoryRepository, InventoryRepository, InventorySnapshot, JsonFileInventoryRepository,
    RepositoryError,
};
pub use service::{CommitReport, IntakeReport, InventoryService, ServiceError};
pub use workers::snapshot_watcher::{SnapshotWatcher, WatchHandle};
