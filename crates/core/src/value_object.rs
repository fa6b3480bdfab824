//! Value object trait: equality by value, not identity.
//!
//! Computation outputs (allocation slices, shortfalls, per-lot balances) are
//! value objects: they are produced fresh on every call and two outputs with
//! the same fields are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** once produced and **compared by value**.
/// Re-running a deterministic computation over the same input must yield
/// value objects that compare equal, which is what makes re-computation
/// checkable in tests.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
