//! Turning confirmed plans into per-item ledger updates.
//!
//! Plans are flattened into `(item, batch, quantity)` lines, grouped so that
//! each item is read and written once, and then applied to the current ledger.
//! Lines whose batch no longer exists are skipped: a plan may be stale by the
//! time it is committed, and that is tolerated rather than treated as a
//! conflict.

use serde::{Deserialize, Serialize};

use shelflife_core::{BatchId, ItemId};

use crate::ledger::BatchLedger;
use crate::planner::DeductionPlan;

/// One flattened deduction across a multi-item commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionLine {
    pub item_id: ItemId,
    pub batch_id: BatchId,
    pub quantity_to_take: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeduction {
    pub batch_id: BatchId,
    pub quantity: u32,
}

/// All deductions touching one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDeductions {
    pub item_id: ItemId,
    pub deductions: Vec<BatchDeduction>,
}

pub fn flatten_plans(plans: &[DeductionPlan]) -> Vec<DeductionLine> {
    plans
        .iter()
        .flat_map(|plan| {
            plan.deductions.iter().map(|d| DeductionLine {
                item_id: plan.item_id.clone(),
                batch_id: d.batch_id.clone(),
                quantity_to_take: d.quantity_to_take,
            })
        })
        .collect()
}

/// Group lines by item, items in order of first appearance.
pub fn group_by_item(lines: &[DeductionLine]) -> Vec<ItemDeductions> {
    let mut groups: Vec<ItemDeductions> = Vec::new();
    for line in lines {
        let deduction = BatchDeduction {
            batch_id: line.batch_id.clone(),
            quantity: line.quantity_to_take,
        };
        match groups.iter_mut().find(|g| g.item_id == line.item_id) {
            Some(group) => group.deductions.push(deduction),
            None => groups.push(ItemDeductions {
                item_id: line.item_id.clone(),
                deductions: vec![deduction],
            }),
        }
    }
    groups
}

/// Outcome of applying one item's deductions to its current ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerApplication {
    pub ledger: BatchLedger,
    /// Units actually removed (over-deductions are clamped to what existed).
    pub taken: u64,
    /// Batches referenced by the plan that no longer exist.
    pub skipped: Vec<BatchId>,
}

/// Apply every deduction in order as one compound update.
pub fn apply_to_ledger(ledger: &BatchLedger, deductions: &[BatchDeduction]) -> LedgerApplication {
    let mut current = ledger.clone();
    let mut skipped = Vec::new();

    for d in deductions {
        if current.get(&d.batch_id).is_none() {
            skipped.push(d.batch_id.clone());
            continue;
        }
        current = current.deduct(&d.batch_id, d.quantity);
    }

    LedgerApplication {
        taken: ledger.total_stock() - current.total_stock(),
        ledger: current,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Batch;
    use crate::category::Category;
    use crate::item::InventoryItem;
    use crate::planner::plan_deduction;
    use chrono::NaiveDate;
    use shelflife_core::Entity;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bid(s: &str) -> BatchId {
        s.parse().unwrap()
    }

    fn item(id: &str, batches: &[(&str, &str, u32)]) -> InventoryItem {
        InventoryItem::with_id(id.parse().unwrap(), id, Category::Other)
            .unwrap()
            .with_ledger(BatchLedger::from_batches(
                batches.iter().map(|(b, d, q)| Batch::new(bid(b), date(d), *q)),
            ).unwrap())
    }

    #[test]
    fn flatten_and_group_keep_item_order() {
        let a = item("a", &[("a1", "2025-05-01", 2), ("a2", "2025-06-01", 5)]);
        let b = item("b", &[("b1", "2025-05-01", 4)]);
        let plans = vec![plan_deduction(&a, 4), plan_deduction(&b, 1)];

        let lines = flatten_plans(&plans);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].item_id, *a.id());
        assert_eq!(lines[2].item_id, *b.id());

        let groups = group_by_item(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].item_id, *a.id());
        assert_eq!(groups[0].deductions.len(), 2);
        assert_eq!(groups[1].deductions, vec![BatchDeduction { batch_id: bid("b1"), quantity: 1 }]);
    }

    #[test]
    fn group_merges_interleaved_lines_of_one_item() {
        let line = |i: &str, b: &str, q| DeductionLine {
            item_id: i.parse().unwrap(),
            batch_id: bid(b),
            quantity_to_take: q,
        };
        let groups = group_by_item(&[line("a", "a1", 1), line("b", "b1", 1), line("a", "a2", 2)]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].deductions.len(), 2);
    }

    #[test]
    fn apply_round_trip_reduces_stock_by_plan_total() {
        let a = item("a", &[("a1", "2025-05-01", 3), ("a2", "2025-06-01", 5), ("a3", "2025-07-01", 10)]);
        let plan = plan_deduction(&a, 6);
        let groups = group_by_item(&flatten_plans(std::slice::from_ref(&plan)));

        let result = apply_to_ledger(a.ledger(), &groups[0].deductions);
        assert!(result.skipped.is_empty());
        assert_eq!(result.taken, plan.total_planned());
        assert_eq!(result.ledger.total_stock(), a.total_stock() - plan.total_planned());
        assert!(result.ledger.get(&bid("a1")).is_none());
        assert_eq!(result.ledger.get(&bid("a2")).unwrap().quantity(), 2);
    }

    #[test]
    fn stale_batches_are_skipped() {
        let a = item("a", &[("a1", "2025-05-01", 3)]);
        let deductions = vec![
            BatchDeduction { batch_id: bid("gone"), quantity: 2 },
            BatchDeduction { batch_id: bid("a1"), quantity: 1 },
        ];

        let result = apply_to_ledger(a.ledger(), &deductions);
        assert_eq!(result.skipped, vec![bid("gone")]);
        assert_eq!(result.taken, 1);
        assert_eq!(result.ledger.get(&bid("a1")).unwrap().quantity(), 2);
    }

    #[test]
    fn clamped_over_deduction_counts_only_existing_units() {
        let a = item("a", &[("a1", "2025-05-01", 3)]);
        let result = apply_to_ledger(a.ledger(), &[BatchDeduction { batch_id: bid("a1"), quantity: 8 }]);
        assert!(result.ledger.is_empty());
        assert_eq!(result.taken, 3);
    }
}
