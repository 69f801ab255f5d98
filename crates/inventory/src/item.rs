use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shelflife_core::{BatchId, DomainError, DomainResult, Entity, ItemId};

use crate::category::Category;
use crate::ledger::BatchLedger;

/// An inventory item and its batch ledger.
///
/// Persisted shape:
/// `{ "id": ..., "name": ..., "category": ..., "batches": [...] }`.
/// A missing `batches` field deserializes to an empty ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    name: String,
    category: Category,
    #[serde(default)]
    batches: BatchLedger,
}

impl InventoryItem {
    /// Create a new item with a fresh id and an empty ledger.
    pub fn create(name: &str, category: Category) -> DomainResult<Self> {
        Self::with_id(ItemId::new(), name, category)
    }

    pub fn with_id(id: ItemId, name: &str, category: Category) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: validate_name(name)?,
            category,
            batches: BatchLedger::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn ledger(&self) -> &BatchLedger {
        &self.batches
    }

    pub fn total_stock(&self) -> u64 {
        self.batches.total_stock()
    }

    pub fn renamed(&self, name: &str) -> DomainResult<Self> {
        Ok(Self {
            name: validate_name(name)?,
            ..self.clone()
        })
    }

    /// Same item, different ledger.
    pub fn with_ledger(&self, batches: BatchLedger) -> Self {
        Self {
            batches,
            ..self.clone()
        }
    }

    pub fn intake(&self, expiry_date: NaiveDate, quantity: i64) -> DomainResult<Self> {
        Ok(self.with_ledger(self.batches.intake(expiry_date, quantity)?))
    }

    pub fn correct(
        &self,
        batch_id: &BatchId,
        new_quantity: i64,
        new_expiry_date: Option<NaiveDate>,
    ) -> DomainResult<Self> {
        Ok(self.with_ledger(self.batches.correct(batch_id, new_quantity, new_expiry_date)?))
    }

    pub fn deduct(&self, batch_id: &BatchId, amount: u32) -> Self {
        self.with_ledger(self.batches.deduct(batch_id, amount))
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Trimmed item name, rejecting blank input.
pub fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn create_starts_with_empty_ledger() {
        let item = InventoryItem::create("  Original pineapple cake ", Category::PineappleCake).unwrap();
        assert_eq!(item.name(), "Original pineapple cake");
        assert!(item.ledger().is_empty());
        assert_eq!(item.total_stock(), 0);
    }

    #[test]
    fn create_rejects_blank_name() {
        let err = InventoryItem::create("   ", Category::Cake).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("name")),
            _ => panic!("Expected Validation error for blank name"),
        }
    }

    #[test]
    fn rename_keeps_identity_and_ledger() {
        let item = InventoryItem::create("Egg yolk pastry", Category::PuffPastry)
            .unwrap()
            .intake(date("2025-05-20"), 1)
            .unwrap();
        let renamed = item.renamed("Egg yolk puff").unwrap();

        assert_eq!(renamed.id(), item.id());
        assert_eq!(renamed.name(), "Egg yolk puff");
        assert_eq!(renamed.ledger(), item.ledger());
        assert!(item.renamed("").is_err());
    }

    #[test]
    fn missing_batches_field_deserializes_to_empty_ledger() {
        let json = r#"{"id": "1", "name": "Sun cake", "category": "cake"}"#;
        let item: InventoryItem = serde_json::from_str(json).unwrap();
        assert!(item.ledger().is_empty());
        assert_eq!(item.category(), Category::Cake);
    }

    #[test]
    fn label_categories_load_and_resave_as_keys() {
        let json = r#"{
            "id": "1",
            "name": "Pineapple cake",
            "category": "鳳梨酥類",
            "batches": [{"id": "b1", "expiryDate": "2025-06-01", "quantity": 4}]
        }"#;
        let item: InventoryItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.category(), Category::PineappleCake);
        assert_eq!(item.total_stock(), 4);
        assert_eq!(serde_json::to_value(&item).unwrap()["category"], "pineapple_cake");
    }

    #[test]
    fn persisted_shape_matches_schema() {
        let id: ItemId = "item-1".parse().unwrap();
        let item = InventoryItem::with_id(id, "Sun cake", Category::Cake)
            .unwrap()
            .with_ledger(BatchLedger::from_batches([crate::Batch::new(
                "b1".parse().unwrap(),
                date("2025-12-31"),
                10,
            )])
            .unwrap());

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "item-1",
                "name": "Sun cake",
                "category": "cake",
                "batches": [{"id": "b1", "expiryDate": "2025-12-31", "quantity": 10}]
            })
        );
    }
}
