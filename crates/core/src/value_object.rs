//! Value object trait: equality by value, not identity.
//!
//! Records flowing between the planning stages (periods, forecast points,
//! recommendations) carry no identity of their own beyond their fields.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. A stage never
/// mutates a record it received from an upstream stage; it derives a new one.
///
/// The trait requires:
/// - **Clone**: records are handed to reporting by value
/// - **PartialEq**: compared by their attribute values (determinism checks rely on this)
/// - **Debug**: helpful for logging and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
