//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects carry no identity and are compared by their attributes. A
/// generated price is one: two draws with the same price, percentage and
/// direction are interchangeable.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Quote { price: Decimal, direction: PriceDirection }
///
/// impl ValueObject for Quote {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
