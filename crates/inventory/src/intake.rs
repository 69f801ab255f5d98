//! Bulk intake: many `(item, expiry date, quantity)` entries received at once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shelflife_core::{DomainError, DomainResult, ItemId};

use crate::ledger::BatchLedger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeEntry {
    pub item_id: ItemId,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
}

impl IntakeEntry {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "intake quantity for item {} must be greater than 0",
                self.item_id
            )));
        }
        if u32::try_from(self.quantity).is_err() {
            return Err(DomainError::validation(format!(
                "intake quantity for item {} is out of range",
                self.item_id
            )));
        }
        Ok(())
    }
}

/// Intake entries for one item, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemIntake {
    pub item_id: ItemId,
    pub entries: Vec<(NaiveDate, i64)>,
}

impl ItemIntake {
    /// Apply all entries to `ledger`, merging same-date batches as usual.
    pub fn apply(&self, ledger: &BatchLedger) -> DomainResult<BatchLedger> {
        self.entries
            .iter()
            .try_fold(ledger.clone(), |acc, (date, qty)| acc.intake(*date, *qty))
    }
}

/// Validate every entry, then group by item (first-appearance order).
///
/// Validation covers the whole batch before anything is grouped, so one bad
/// entry rejects the entire intake.
pub fn group_intake(entries: &[IntakeEntry]) -> DomainResult<Vec<ItemIntake>> {
    for entry in entries {
        entry.validate()?;
    }

    let mut groups: Vec<ItemIntake> = Vec::new();
    for entry in entries {
        let row = (entry.expiry_date, entry.quantity);
        match groups.iter_mut().find(|g| g.item_id == entry.item_id) {
            Some(group) => group.entries.push(row),
            None => groups.push(ItemIntake {
                item_id: entry.item_id.clone(),
                entries: vec![row],
            }),
        }
    }
    Ok(groups)
}
