//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and defined entirely by their attribute
/// values; two with the same values are the same thing. A `FilterSelection`
/// of `{category: pumps}` equals any other selection of `{category: pumps}`,
/// while two `Product`s with equal attributes are still distinct entities.
///
/// To "modify" a value object, build a new one. This keeps them safe to
/// share, copy, and compare like primitives.
///
/// The supertraits are the minimum for that lifestyle:
/// - `Clone`: values are passed around by copy, not by reference juggling
/// - `PartialEq`: comparison is attribute-wise
/// - `Debug`: values show up in logs and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
