//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. Grades
/// and matching criteria are value objects: a `VS1` is a `VS1` wherever it
/// appears, and two criteria with the same tolerances select the same sets.
///
/// To "modify" a value object, build a new one:
///
/// ```ignore
/// let strict = MatchingCriteria {
///     color_match: MatchMode::Exact,
///     ..MatchingCriteria::default()
/// };
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
