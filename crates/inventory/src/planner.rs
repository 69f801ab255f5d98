//! FIFO-by-expiry deduction planning.
//!
//! A plan is a proposal: it is computed from a snapshot, shown for
//! confirmation, and then either committed or discarded. Planning never
//! mutates the snapshot, so it can be recomputed freely while a requested
//! quantity is being edited.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shelflife_core::{BatchId, DomainError, DomainResult, Entity, ItemId};

use crate::item::InventoryItem;

/// One batch-level step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedDeduction {
    pub batch_id: BatchId,
    pub expiry_date: NaiveDate,
    pub quantity_to_take: u32,
}

/// Proposed consumption for one item.
///
/// `is_complete` is false when stock was insufficient; the plan then drains
/// everything that exists and the unmet remainder is [`DeductionPlan::shortfall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionPlan {
    pub item_id: ItemId,
    pub item_name: String,
    pub total_requested: u32,
    pub deductions: Vec<PlannedDeduction>,
    pub is_complete: bool,
}

impl DeductionPlan {
    /// Sum of `quantity_to_take` over all deductions.
    pub fn total_planned(&self) -> u64 {
        self.deductions
            .iter()
            .map(|d| u64::from(d.quantity_to_take))
            .sum()
    }

    /// Requested units the plan could not cover.
    pub fn shortfall(&self) -> u64 {
        u64::from(self.total_requested).saturating_sub(self.total_planned())
    }
}

/// Plan taking `quantity_requested` units of `item`, earliest expiry first.
///
/// Requesting 0 yields an empty, complete plan. Insufficient stock is not an
/// error: the plan is returned with `is_complete = false`.
pub fn plan_deduction(item: &InventoryItem, quantity_requested: u32) -> DeductionPlan {
    let mut remaining = quantity_requested;
    let mut deductions = Vec::new();

    for batch in item.ledger().by_expiry() {
        if remaining == 0 {
            break;
        }
        let take = batch.quantity().min(remaining);
        if take == 0 {
            continue;
        }
        deductions.push(PlannedDeduction {
            batch_id: batch.id().clone(),
            expiry_date: batch.expiry_date(),
            quantity_to_take: take,
        });
        remaining -= take;
    }

    DeductionPlan {
        item_id: item.id().clone(),
        item_name: item.name().to_string(),
        total_requested: quantity_requested,
        deductions,
        is_complete: remaining == 0,
    }
}

/// A validated multi-item take request.
///
/// Every line asks for a positive quantity of a distinct item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeOrder {
    lines: Vec<(ItemId, u32)>,
}

impl TakeOrder {
    pub fn new(lines: impl IntoIterator<Item = (ItemId, i64)>) -> DomainResult<Self> {
        let mut validated: Vec<(ItemId, u32)> = Vec::new();
        for (item_id, quantity) in lines {
            if quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "quantity for item {item_id} must be greater than 0"
                )));
            }
            let quantity = u32::try_from(quantity).map_err(|_| {
                DomainError::validation(format!("quantity for item {item_id} is out of range"))
            })?;
            if validated.iter().any(|(id, _)| *id == item_id) {
                return Err(DomainError::validation(format!(
                    "item {item_id} appears more than once"
                )));
            }
            validated.push((item_id, quantity));
        }
        if validated.is_empty() {
            return Err(DomainError::validation("take order has no lines"));
        }
        Ok(Self { lines: validated })
    }

    pub fn lines(&self) -> &[(ItemId, u32)] {
        &self.lines
    }
}

/// Plan every line of `order` against the `items` snapshot, in order.
///
/// Fails with `NotFound` if a line references an item absent from the snapshot.
pub fn plan_take(items: &[InventoryItem], order: &TakeOrder) -> DomainResult<Vec<DeductionPlan>> {
    order
        .lines()
        .iter()
        .map(|(item_id, quantity)| {
            items
                .iter()
                .find(|i| i.id() == item_id)
                .map(|item| plan_deduction(item, *quantity))
                .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))
        })
        .collect()
}
