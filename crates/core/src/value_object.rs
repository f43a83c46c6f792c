//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values.
/// Constructors validate once, so a value that exists is always well-formed:
///
/// ```ignore
/// let fee = MonthlyFee::new("9.99".parse()?)?;
/// assert_eq!(fee, MonthlyFee::new("9.990".parse()?)?);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
