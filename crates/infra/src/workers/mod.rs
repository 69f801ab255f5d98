//! Background workers.

pub mod snapshot_watcher;
