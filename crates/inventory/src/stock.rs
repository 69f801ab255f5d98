//! Stock aggregation and alerting (pure functions over a ledger snapshot).
//!
//! Every function that depends on the calendar takes `today` explicitly;
//! [`today`] provides the local calendar date for callers that want "now".

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use shelflife_core::{Entity, ItemId};

use crate::batch::Batch;
use crate::category::Category;
use crate::item::InventoryItem;

pub const DEFAULT_EXPIRING_WITHIN_DAYS: i64 = 7;
pub const DEFAULT_LOW_STOCK_AT: u64 = 3;

/// Thresholds driving the expiring-soon and low-stock alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// A batch expiring within this many days (inclusive) raises an alert.
    pub expiring_within_days: i64,
    /// Total stock at or below this (but above zero) is "low".
    pub low_stock_at: u64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            expiring_within_days: DEFAULT_EXPIRING_WITHIN_DAYS,
            low_stock_at: DEFAULT_LOW_STOCK_AT,
        }
    }
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn total_stock(item: &InventoryItem) -> u64 {
    item.ledger().total_stock()
}

/// Whole calendar days from `today` until `expiry_date`.
///
/// Today yields 0, past dates are negative.
pub fn days_remaining(expiry_date: NaiveDate, today: NaiveDate) -> i64 {
    expiry_date.signed_duration_since(today).num_days()
}

/// True when the item has stock and any batch expires within `threshold_days`
/// (already-expired batches included). An empty item is out of stock, never
/// "expiring".
pub fn is_expiring_soon(item: &InventoryItem, today: NaiveDate, threshold_days: i64) -> bool {
    if total_stock(item) == 0 {
        return false;
    }
    item.ledger()
        .batches()
        .iter()
        .any(|b| days_remaining(b.expiry_date(), today) <= threshold_days)
}

/// True iff `0 < total_stock <= threshold`.
pub fn is_low_stock(item: &InventoryItem, threshold: u64) -> bool {
    let total = total_stock(item);
    total > 0 && total <= threshold
}

/// Stable ascending sort by expiry date (consumption and display order).
pub fn sort_batches(batches: &[Batch]) -> Vec<Batch> {
    let mut sorted = batches.to_vec();
    sorted.sort_by_key(|b| b.expiry_date());
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Low,
    InStock,
}

pub fn stock_status(item: &InventoryItem, low_stock_at: u64) -> StockStatus {
    if total_stock(item) == 0 {
        StockStatus::OutOfStock
    } else if is_low_stock(item, low_stock_at) {
        StockStatus::Low
    } else {
        StockStatus::InStock
    }
}

/// Items shown in the "needs attention" view.
pub fn needs_attention(item: &InventoryItem, today: NaiveDate, thresholds: AlertThresholds) -> bool {
    is_expiring_soon(item, today, thresholds.expiring_within_days)
        || is_low_stock(item, thresholds.low_stock_at)
}

/// A browsing view: one category, or the synthetic alerts view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryView {
    Category(Category),
    NeedsAttention,
}

impl InventoryView {
    pub fn includes(&self, item: &InventoryItem, today: NaiveDate, thresholds: AlertThresholds) -> bool {
        match self {
            InventoryView::Category(c) => item.category() == *c,
            InventoryView::NeedsAttention => needs_attention(item, today, thresholds),
        }
    }

    pub fn filter<'a>(
        &self,
        items: &'a [InventoryItem],
        today: NaiveDate,
        thresholds: AlertThresholds,
    ) -> Vec<&'a InventoryItem> {
        items
            .iter()
            .filter(|i| self.includes(i, today, thresholds))
            .collect()
    }
}

/// Display-ready digest of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub item_id: ItemId,
    pub name: String,
    pub category: Category,
    pub total_stock: u64,
    pub status: StockStatus,
    pub expiring_soon: bool,
    pub nearest_expiry: Option<NaiveDate>,
    pub days_remaining: Option<i64>,
}

impl StockSummary {
    pub fn of(item: &InventoryItem, today: NaiveDate, thresholds: AlertThresholds) -> Self {
        let nearest_expiry = item.ledger().nearest_expiry().map(Batch::expiry_date);
        Self {
            item_id: item.id().clone(),
            name: item.name().to_string(),
            category: item.category(),
            total_stock: total_stock(item),
            status: stock_status(item, thresholds.low_stock_at),
            expiring_soon: is_expiring_soon(item, today, thresholds.expiring_within_days),
            nearest_expiry,
            days_remaining: nearest_expiry.map(|d| days_remaining(d, today)),
        }
    }
}
