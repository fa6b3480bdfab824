//! Entity trait: identity + continuity across state changes.

use std::collections::BTreeMap;

/// Entity marker + minimal interface.
///
/// Lots, transactions and products are entities: two records with the same
/// quantity are still distinct if their identifiers differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Identifiers that occur more than once in `items`, ascending.
pub fn duplicate_ids<T: Entity>(items: &[T]) -> Vec<T::Id> {
    let mut counts: BTreeMap<T::Id, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(*item.id()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id)
        .collect()
}
