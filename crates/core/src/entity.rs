//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// The id must never change for the lifetime of the value; tables index
/// records by it.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
