//! The symbolic state-set abstraction.
//!
//! Everything the fixpoint algorithms do is expressed through this small
//! set algebra, so any representation that satisfies the contracts works:
//! the BDD backend in [`symbolic`][crate::symbolic], the explicit bit-set
//! backend in [`explicit`][crate::explicit], or an external package.

/// An immutable set of system states (or input assignments).
///
/// All operations return new sets; two sets are interchangeable iff they
/// denote the same underlying set of assignments, regardless of the
/// internal representation.
pub trait StateSet: Clone {
    /// `self ∪ other`.
    fn union(&self, other: &Self) -> Self;

    /// `self ∩ other`.
    fn intersect(&self, other: &Self) -> Self;

    /// `self ∖ other`.
    fn subtract(&self, other: &Self) -> Self;

    fn is_empty(&self) -> bool;

    /// Inclusion test: `self ⊆ other`.
    fn entails(&self, other: &Self) -> bool;
}
