use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shelflife_core::{BatchId, Entity};

/// A quantity of a single item sharing one expiry date.
///
/// Persisted as `{ "id": ..., "expiryDate": "YYYY-MM-DD", "quantity": n }`.
/// Inside a [`crate::BatchLedger`] the quantity is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    id: BatchId,
    expiry_date: NaiveDate,
    quantity: u32,
}

impl Batch {
    pub fn new(id: BatchId, expiry_date: NaiveDate, quantity: u32) -> Self {
        Self {
            id,
            expiry_date,
            quantity,
        }
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    pub(crate) fn set_expiry_date(&mut self, expiry_date: NaiveDate) {
        self.expiry_date = expiry_date;
    }
}

impl Entity for Batch {
    type Id = BatchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
