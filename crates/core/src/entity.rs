//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// A diamond keeps its identity while its status, location or price change;
/// two diamonds with identical grades are still two different stones.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
