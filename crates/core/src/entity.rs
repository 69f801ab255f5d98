//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Inventory items and their batches are both entities: a batch keeps its id
/// while its quantity is merged into or drawn down, and an item keeps its id
/// across renames and ledger changes.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
