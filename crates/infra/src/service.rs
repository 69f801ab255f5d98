//! Application service: the read-modify-write orchestration over a repository.
//!
//! Domain rules live in `shelflife-inventory`; this layer validates input
//! before any I/O, loads the item, runs the pure transformation, and writes the
//! whole item back.
//!
//! Commit flow:
//!
//! ```text
//! plans ─▶ flatten ─▶ group by item ─▶ per item: get ─▶ apply deductions ─▶ put
//! ```
//!
//! Items are committed one at a time. A repository failure stops the commit and
//! is returned; items already written stay written.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use shelflife_core::{BatchId, DomainError, Entity, ItemId};
use shelflife_events::Subscription;
use shelflife_inventory::{
    AlertThresholds, Category, DeductionLine, DeductionPlan, IntakeEntry, InventoryItem,
    InventoryView, StockSummary, TakeOrder, apply_to_ledger, flatten_plans, group_by_item,
    group_intake, plan_deduction, validate_name,
};

use crate::repository::{InventoryRepository, InventorySnapshot, RepositoryError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::NotFound(msg) => ServiceError::NotFound(msg),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Outcome of a bulk intake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub items_updated: usize,
    pub units_received: u64,
    /// Items named by the intake that do not exist; their entries were dropped.
    pub missing_items: Vec<ItemId>,
}

/// Outcome of committing a set of plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub items_updated: usize,
    pub units_taken: u64,
    /// Lines whose item or batch no longer existed.
    pub skipped: Vec<DeductionLine>,
}

#[derive(Debug)]
pub struct InventoryService<R> {
    repo: R,
    thresholds: AlertThresholds,
}

impl<R> InventoryService<R>
where
    R: InventoryRepository,
{
    pub fn new(repo: R, thresholds: AlertThresholds) -> Self {
        Self { repo, thresholds }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    pub fn snapshot(&self) -> ServiceResult<InventorySnapshot> {
        Ok(self.repo.list_items()?)
    }

    /// Live snapshots: the current one first, then one per change.
    pub fn subscribe(&self) -> Subscription<InventorySnapshot> {
        self.repo.subscribe()
    }

    pub fn get_item(&self, item_id: &ItemId) -> ServiceResult<InventoryItem> {
        self.repo
            .get_item(item_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("item {item_id}")))
    }

    /// Summaries of the items in `view` (all items when `None`), in id order.
    pub fn summaries(&self, view: Option<InventoryView>, today: NaiveDate) -> ServiceResult<Vec<StockSummary>> {
        let snapshot = self.repo.list_items()?;
        Ok(snapshot
            .items()
            .iter()
            .filter(|item| view.is_none_or(|v| v.includes(item, today, self.thresholds)))
            .map(|item| StockSummary::of(item, today, self.thresholds))
            .collect())
    }

    // ── catalogue ───────────────────────────────────────────────────────

    pub fn create_item(&self, name: &str, category: Category) -> ServiceResult<InventoryItem> {
        let item = InventoryItem::create(name, category)?;
        self.repo.put_item(item.clone())?;
        info!(item_id = %item.id(), name = item.name(), category = category.key(), "item created");
        Ok(item)
    }

    pub fn rename_item(&self, item_id: &ItemId, name: &str) -> ServiceResult<InventoryItem> {
        let name = validate_name(name)?;
        let item = self.get_item(item_id)?.renamed(&name)?;
        self.repo.put_item(item.clone())?;
        info!(item_id = %item_id, name = %name, "item renamed");
        Ok(item)
    }

    /// Delete an item and its whole ledger.
    pub fn delete_item(&self, item_id: &ItemId) -> ServiceResult<()> {
        if !self.repo.delete_item(item_id)? {
            return Err(ServiceError::NotFound(format!("item {item_id}")));
        }
        info!(item_id = %item_id, "item deleted");
        Ok(())
    }

    // ── stock changes ───────────────────────────────────────────────────

    /// Receive `quantity` units expiring on `expiry_date`.
    pub fn add_stock(&self, item_id: &ItemId, expiry_date: NaiveDate, quantity: i64) -> ServiceResult<InventoryItem> {
        IntakeEntry {
            item_id: item_id.clone(),
            expiry_date,
            quantity,
        }
        .validate()?;

        let item = self.get_item(item_id)?.intake(expiry_date, quantity)?;
        self.repo.put_item(item.clone())?;
        info!(item_id = %item_id, %expiry_date, quantity, total = item.total_stock(), "stock received");
        Ok(item)
    }

    /// Apply many intake entries; each item is read and written once.
    ///
    /// Every entry is validated before anything is read. Entries for unknown
    /// items are dropped and reported.
    pub fn receive(&self, entries: &[IntakeEntry]) -> ServiceResult<IntakeReport> {
        let groups = group_intake(entries)?;
        let mut report = IntakeReport::default();

        for group in groups {
            let Some(item) = self.repo.get_item(&group.item_id)? else {
                warn!(item_id = %group.item_id, entries = group.entries.len(), "intake for unknown item skipped");
                report.missing_items.push(group.item_id);
                continue;
            };

            let ledger = group.apply(item.ledger())?;
            let received = ledger.total_stock() - item.total_stock();
            self.repo.put_item(item.with_ledger(ledger))?;

            report.items_updated += 1;
            report.units_received += received;
            info!(item_id = %group.item_id, received, "bulk intake applied");
        }

        Ok(report)
    }

    /// Manually correct one batch. A quantity `<= 0` removes the batch.
    pub fn correct_batch(
        &self,
        item_id: &ItemId,
        batch_id: &BatchId,
        new_quantity: i64,
        new_expiry_date: Option<NaiveDate>,
    ) -> ServiceResult<InventoryItem> {
        let item = self.get_item(item_id)?;
        if item.ledger().get(batch_id).is_none() {
            warn!(item_id = %item_id, batch_id = %batch_id, "correction for unknown batch ignored");
            return Ok(item);
        }

        let corrected = item.correct(batch_id, new_quantity, new_expiry_date)?;
        self.repo.put_item(corrected.clone())?;
        info!(
            item_id = %item_id,
            batch_id = %batch_id,
            new_quantity,
            new_expiry_date = ?new_expiry_date,
            total = corrected.total_stock(),
            "batch corrected"
        );
        Ok(corrected)
    }

    // ── take flow ───────────────────────────────────────────────────────

    /// Plan taking `quantity` units of one item from the current snapshot.
    pub fn plan(&self, item_id: &ItemId, quantity: u32) -> ServiceResult<DeductionPlan> {
        let plan = plan_deduction(&self.get_item(item_id)?, quantity);
        debug!(item_id = %item_id, requested = quantity, planned = plan.total_planned(), complete = plan.is_complete, "plan computed");
        Ok(plan)
    }

    /// Plan every line of `order` against one snapshot.
    pub fn plan_take(&self, order: &TakeOrder) -> ServiceResult<Vec<DeductionPlan>> {
        let snapshot = self.repo.list_items()?;
        let plans = shelflife_inventory::plan_take(snapshot.items(), order)?;
        for plan in &plans {
            debug!(
                item_id = %plan.item_id,
                requested = plan.total_requested,
                planned = plan.total_planned(),
                complete = plan.is_complete,
                "plan computed"
            );
        }
        Ok(plans)
    }

    /// Persist confirmed plans.
    ///
    /// Missing items and batches are skipped and reported, never an error.
    pub fn commit(&self, plans: &[DeductionPlan]) -> ServiceResult<CommitReport> {
        let lines = flatten_plans(plans);
        let mut report = CommitReport::default();

        for group in group_by_item(&lines) {
            let Some(item) = self.repo.get_item(&group.item_id)? else {
                warn!(item_id = %group.item_id, "commit skipped deductions for missing item");
                report
                    .skipped
                    .extend(lines.iter().filter(|l| l.item_id == group.item_id).cloned());
                continue;
            };

            let applied = apply_to_ledger(item.ledger(), &group.deductions);
            for batch_id in &applied.skipped {
                warn!(item_id = %group.item_id, batch_id = %batch_id, "commit skipped deduction for missing batch");
            }
            report.skipped.extend(
                lines
                    .iter()
                    .filter(|l| l.item_id == group.item_id && applied.skipped.contains(&l.batch_id))
                    .cloned(),
            );

            if applied.ledger == *item.ledger() {
                continue;
            }
            self.repo.put_item(item.with_ledger(applied.ledger))?;
            report.items_updated += 1;
            report.units_taken += applied.taken;
            info!(item_id = %group.item_id, taken = applied.taken, "deductions committed");
        }

        Ok(report)
    }
}
