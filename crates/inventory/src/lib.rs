//! Inventory domain module.
//!
//! This crate contains the business rules for perishable stock: the batch
//! ledger, stock aggregation and alerting, and the FIFO-by-expiry deduction
//! planner. Everything here is deterministic domain logic (no IO, no storage);
//! ledger mutations take a snapshot and return a new one.

pub mod batch;
pub mod category;
pub mod commit;
pub mod intake;
pub mod item;
pub mod ledger;
pub mod planner;
pub mod stock;

pub use batch::Batch;
pub use category::Category;
pub use commit::{
    BatchDeduction, DeductionLine, ItemDeductions, LedgerApplication, apply_to_ledger,
    flatten_plans, group_by_item,
};
pub use intake::{IntakeEntry, ItemIntake, group_intake};
pub use item::{InventoryItem, validate_name};
pub use ledger::BatchLedger;
pub use planner::{DeductionPlan, PlannedDeduction, TakeOrder, plan_deduction, plan_take};
pub use stock::{
    AlertThresholds, InventoryView, StockStatus, StockSummary, days_remaining, is_expiring_soon,
    is_low_stock, sort_batches, stock_status, total_stock,
};
