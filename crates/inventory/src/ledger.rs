use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shelflife_core::{BatchId, DomainError, DomainResult, Entity};

use crate::batch::Batch;

/// The full set of batches belonging to one item.
///
/// Invariants (upheld by every operation and by deserialization):
/// - no two batches share an expiry date
/// - every batch has a positive quantity; exhausted batches are removed
///
/// Storage order is insertion order and carries no meaning; consumption order
/// is always recomputed with [`BatchLedger::by_expiry`].
///
/// Mutations are value transformations: each takes `&self` and returns the
/// resulting ledger, leaving the snapshot it was called on untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Batch>", into = "Vec<Batch>")]
pub struct BatchLedger {
    batches: Vec<Batch>,
}

impl BatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from raw rows, restoring the invariants.
    ///
    /// Zero-quantity rows are dropped; rows sharing an expiry date are merged
    /// into the first one seen (which keeps its id). A merge that would not fit
    /// in a batch quantity is an `InvariantViolation`.
    pub fn from_batches(rows: impl IntoIterator<Item = Batch>) -> DomainResult<Self> {
        let mut batches: Vec<Batch> = Vec::new();
        for row in rows {
            if row.quantity() == 0 {
                continue;
            }
            match batches.iter_mut().find(|b| b.expiry_date() == row.expiry_date()) {
                Some(existing) => {
                    let merged = existing.quantity().checked_add(row.quantity()).ok_or_else(|| {
                        DomainError::invariant(format!(
                            "batches expiring {} exceed the maximum batch quantity",
                            row.expiry_date()
                        ))
                    })?;
                    existing.set_quantity(merged);
                }
                None => batches.push(row),
            }
        }
        Ok(Self { batches })
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn get(&self, batch_id: &BatchId) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id() == batch_id)
    }

    pub fn find_by_date(&self, expiry_date: NaiveDate) -> Option<&Batch> {
        self.batches.iter().find(|b| b.expiry_date() == expiry_date)
    }

    /// Sum of all batch quantities.
    pub fn total_stock(&self) -> u64 {
        self.batches.iter().map(|b| u64::from(b.quantity())).sum()
    }

    /// Batches in consumption order: earliest expiry first, ties in insertion order.
    pub fn by_expiry(&self) -> Vec<&Batch> {
        let mut sorted: Vec<&Batch> = self.batches.iter().collect();
        sorted.sort_by_key(|b| b.expiry_date());
        sorted
    }

    /// The batch that expires first, if any.
    pub fn nearest_expiry(&self) -> Option<&Batch> {
        self.by_expiry().into_iter().next()
    }

    /// Receive `quantity` units expiring on `expiry_date`.
    ///
    /// Merges into the batch already carrying that date, otherwise appends a
    /// new batch with a freshly generated id. Non-positive quantities are
    /// ignored.
    pub fn intake(&self, expiry_date: NaiveDate, quantity: i64) -> DomainResult<Self> {
        self.intake_with_id(BatchId::new(), expiry_date, quantity)
    }

    /// Same as [`BatchLedger::intake`], using `id` if a new batch is created.
    pub fn intake_with_id(
        &self,
        id: BatchId,
        expiry_date: NaiveDate,
        quantity: i64,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Ok(self.clone());
        }
        let quantity = to_batch_quantity(quantity)?;

        let mut next = self.clone();
        match next.batches.iter_mut().find(|b| b.expiry_date() == expiry_date) {
            Some(existing) => {
                let merged = existing
                    .quantity()
                    .checked_add(quantity)
                    .ok_or_else(|| DomainError::invariant("batch quantity overflow"))?;
                existing.set_quantity(merged);
            }
            None => next.batches.push(Batch::new(id, expiry_date, quantity)),
        }
        Ok(next)
    }

    /// Overwrite a batch's quantity and, optionally, its expiry date.
    ///
    /// - `new_quantity <= 0` removes the batch
    /// - unknown `batch_id` is a no-op
    /// - moving a batch onto a date another batch already holds folds it into
    ///   that batch: the other batch keeps its id and gains `new_quantity`
    pub fn correct(
        &self,
        batch_id: &BatchId,
        new_quantity: i64,
        new_expiry_date: Option<NaiveDate>,
    ) -> DomainResult<Self> {
        let Some(idx) = self.position(batch_id) else {
            return Ok(self.clone());
        };

        let mut next = self.clone();
        if new_quantity <= 0 {
            next.batches.remove(idx);
            return Ok(next);
        }
        let quantity = to_batch_quantity(new_quantity)?;
        let target_date = new_expiry_date.unwrap_or(next.batches[idx].expiry_date());

        let collision = next
            .batches
            .iter()
            .position(|b| b.id() != batch_id && b.expiry_date() == target_date);

        match collision {
            Some(other) => {
                let merged = next.batches[other]
                    .quantity()
                    .checked_add(quantity)
                    .ok_or_else(|| DomainError::invariant("batch quantity overflow"))?;
                next.batches[other].set_quantity(merged);
                next.batches.remove(idx);
            }
            None => {
                let batch = &mut next.batches[idx];
                batch.set_quantity(quantity);
                batch.set_expiry_date(target_date);
            }
        }
        Ok(next)
    }

    /// Take `amount` units out of a batch, removing it once it reaches zero.
    ///
    /// Over-deduction clamps to removal. Unknown batches and zero amounts are
    /// no-ops.
    pub fn deduct(&self, batch_id: &BatchId, amount: u32) -> Self {
        let mut next = self.clone();
        let Some(idx) = next.position(batch_id) else {
            return next;
        };
        if amount == 0 {
            return next;
        }

        let remaining = next.batches[idx].quantity().saturating_sub(amount);
        if remaining == 0 {
            next.batches.remove(idx);
        } else {
            next.batches[idx].set_quantity(remaining);
        }
        next
    }

    fn position(&self, batch_id: &BatchId) -> Option<usize> {
        self.batches.iter().position(|b| b.id() == batch_id)
    }
}

fn to_batch_quantity(quantity: i64) -> DomainResult<u32> {
    u32::try_from(quantity)
        .map_err(|_| DomainError::validation(format!("quantity {quantity} is out of range")))
}

impl TryFrom<Vec<Batch>> for BatchLedger {
    type Error = DomainError;

    fn try_from(rows: Vec<Batch>) -> Result<Self, Self::Error> {
        Self::from_batches(rows)
    }
}

impl From<BatchLedger> for Vec<Batch> {
    fn from(ledger: BatchLedger) -> Self {
        ledger.batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bid(s: &str) -> BatchId {
        s.parse().unwrap()
    }

    fn sample_ledger() -> BatchLedger {
        BatchLedger::from_batches([
            Batch::new(bid("b-jun"), date("2025-06-01"), 5),
            Batch::new(bid("b-may"), date("2025-05-01"), 3),
            Batch::new(bid("b-jul"), date("2025-07-01"), 10),
        ])
        .unwrap()
    }

    #[test]
    fn intake_on_existing_date_merges() {
        let ledger = sample_ledger().intake(date("2025-06-01"), 4).unwrap();

        assert_eq!(ledger.len(), 3);
        let june = ledger.find_by_date(date("2025-06-01")).unwrap();
        assert_eq!(june.id(), &bid("b-jun"));
        assert_eq!(june.quantity(), 9);
    }

    #[test]
    fn intake_on_new_date_appends_batch() {
        let ledger = sample_ledger()
            .intake_with_id(bid("b-aug"), date("2025-08-01"), 2)
            .unwrap();

        assert_eq!(ledger.len(), 4);
        assert_eq!(ledger.get(&bid("b-aug")).unwrap().quantity(), 2);
        assert_eq!(ledger.total_stock(), 20);
    }

    #[test]
    fn intake_ignores_non_positive_quantities() {
        let ledger = sample_ledger();
        assert_eq!(ledger.intake(date("2025-09-01"), 0).unwrap(), ledger);
        assert_eq!(ledger.intake(date("2025-06-01"), -4).unwrap(), ledger);
    }

    #[test]
    fn intake_rejects_overflowing_merge() {
        let ledger = BatchLedger::from_batches([Batch::new(bid("b1"), date("2025-06-01"), u32::MAX)]).unwrap();
        let err = ledger.intake(date("2025-06-01"), 1).unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation for quantity overflow"),
        }
    }

    #[test]
    fn correct_sets_quantity_and_date() {
        let ledger = sample_ledger()
            .correct(&bid("b-may"), 7, Some(date("2025-05-15")))
            .unwrap();

        let batch = ledger.get(&bid("b-may")).unwrap();
        assert_eq!(batch.quantity(), 7);
        assert_eq!(batch.expiry_date(), date("2025-05-15"));
    }

    #[test]
    fn correct_to_zero_removes_batch() {
        let ledger = sample_ledger().correct(&bid("b-jul"), 0, None).unwrap();
        assert!(ledger.get(&bid("b-jul")).is_none());
        assert_eq!(ledger.total_stock(), 8);
    }

    #[test]
    fn correct_onto_taken_date_merges_into_existing_batch() {
        let ledger = sample_ledger()
            .correct(&bid("b-may"), 2, Some(date("2025-06-01")))
            .unwrap();

        assert_eq!(ledger.len(), 2);
        assert!(ledger.get(&bid("b-may")).is_none());
        assert_eq!(ledger.get(&bid("b-jun")).unwrap().quantity(), 7);
    }

    #[test]
    fn correct_unknown_batch_is_noop() {
        let ledger = sample_ledger();
        assert_eq!(ledger.correct(&bid("missing"), 4, None).unwrap(), ledger);
    }

    #[test]
    fn deduct_exact_quantity_removes_batch() {
        let ledger = sample_ledger().deduct(&bid("b-jun"), 5);
        assert!(ledger.get(&bid("b-jun")).is_none());
        assert_eq!(ledger.total_stock(), 13);
    }

    #[test]
    fn over_deduction_clamps_to_removal() {
        let ledger = sample_ledger().deduct(&bid("b-may"), 50);
        assert!(ledger.get(&bid("b-may")).is_none());
        assert_eq!(ledger.total_stock(), 15);
    }

    #[test]
    fn partial_deduction_keeps_batch() {
        let ledger = sample_ledger().deduct(&bid("b-jul"), 4);
        assert_eq!(ledger.get(&bid("b-jul")).unwrap().quantity(), 6);
    }

    #[test]
    fn mutations_leave_the_snapshot_untouched() {
        let before = sample_ledger();
        let _ = before.deduct(&bid("b-jun"), 5);
        let _ = before.intake(date("2025-06-01"), 10).unwrap();
        let _ = before.correct(&bid("b-may"), 0, None).unwrap();
        assert_eq!(before, sample_ledger());
    }

    #[test]
    fn by_expiry_orders_earliest_first() {
        let ledger = sample_ledger();
        let dates: Vec<_> = ledger.by_expiry().iter().map(|b| b.expiry_date()).collect();
        assert_eq!(dates, vec![date("2025-05-01"), date("2025-06-01"), date("2025-07-01")]);
        assert_eq!(ledger.nearest_expiry().unwrap().id(), &bid("b-may"));
    }

    #[test]
    fn deserialization_restores_invariants() {
        let json = r#"[
            {"id": "a", "expiryDate": "2025-06-01", "quantity": 2},
            {"id": "b", "expiryDate": "2025-06-01", "quantity": 3},
            {"id": "c", "expiryDate": "2025-07-01", "quantity": 0}
        ]"#;
        let ledger: BatchLedger = serde_json::from_str(json).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(&bid("a")).unwrap().quantity(), 5);
    }

    #[test]
    fn merging_past_max_quantity_fails_instead_of_truncating() {
        let rows = [
            Batch::new(bid("a"), date("2025-06-01"), u32::MAX),
            Batch::new(bid("b"), date("2025-06-01"), 5),
        ];
        match BatchLedger::from_batches(rows).unwrap_err() {
            DomainError::InvariantViolation(msg) => assert!(msg.contains("2025-06-01")),
            _ => panic!("Expected InvariantViolation for overflowing merge"),
        }

        let json = format!(
            r#"[{{"id": "a", "expiryDate": "2025-06-01", "quantity": {}}},
                {{"id": "b", "expiryDate": "2025-06-01", "quantity": 5}}]"#,
            u32::MAX
        );
        let err = serde_json::from_str::<BatchLedger>(&json).unwrap_err();
        assert!(err.to_string().contains("maximum batch quantity"));
    }

    #[test]
    fn serializes_as_iso_dated_rows() {
        let ledger = BatchLedger::from_batches([Batch::new(bid("b1"), date("2025-06-01"), 5)]).unwrap();
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"id": "b1", "expiryDate": "2025-06-01", "quantity": 5}])
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Intake(u32, i64),
        Correct(usize, i64, Option<u32>),
        Deduct(usize, u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..60, -5i64..50).prop_map(|(d, q)| Op::Intake(d, q)),
            (0usize..8, -5i64..50, proptest::option::of(0u32..60))
                .prop_map(|(i, q, d)| Op::Correct(i, q, d)),
            (0usize..8, 0u32..60).prop_map(|(i, a)| Op::Deduct(i, a)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any sequence of ledger operations keeps dates unique and
        /// quantities positive.
        #[test]
        fn operations_preserve_ledger_invariants(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let base = date("2025-01-01");
            let mut ledger = BatchLedger::new();

            for op in ops {
                ledger = match op {
                    Op::Intake(d, q) => ledger
                        .intake(base + chrono::Days::new(u64::from(d)), q)
                        .unwrap(),
                    Op::Correct(i, q, d) => {
                        let Some(id) = ledger.batches().get(i).map(|b| b.id().clone()) else { continue };
                        let new_date = d.map(|d| base + chrono::Days::new(u64::from(d)));
                        ledger.correct(&id, q, new_date).unwrap()
                    }
                    Op::Deduct(i, a) => {
                        let Some(id) = ledger.batches().get(i).map(|b| b.id().clone()) else { continue };
                        ledger.deduct(&id, a)
                    }
                };

                let mut dates: Vec<_> = ledger.batches().iter().map(|b| b.expiry_date()).collect();
                dates.sort();
                dates.dedup();
                prop_assert_eq!(dates.len(), ledger.len());
                prop_assert!(ledger.batches().iter().all(|b| b.quantity() > 0));
            }
        }

        /// Property: deducting changes total stock by exactly min(amount, batch quantity).
        #[test]
        fn deduct_reduces_total_by_taken_amount(
            quantities in prop::collection::vec(1u32..100, 1..6),
            pick in 0usize..6,
            amount in 0u32..150
        ) {
            let base = date("2025-01-01");
            let ledger = BatchLedger::from_batches(quantities.iter().enumerate().map(|(i, q)| {
                Batch::new(BatchId::new(), base + chrono::Days::new(i as u64), *q)
            }))
            .unwrap();
            let idx = pick % ledger.len();
            let target = ledger.batches()[idx].clone();

            let after = ledger.deduct(target.id(), amount);
            let taken = u64::from(amount.min(target.quantity()));
            prop_assert_eq!(after.total_stock(), ledger.total_stock() - taken);
        }
    }
}
