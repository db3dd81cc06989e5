//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. The backend services
//! use 64-bit numeric IDs everywhere except the payment service, which hands
//! its ID back as a JSON string (see [`PaymentId`]).

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use marigold_core::define_id;
/// define_id!(WarehouseId);
///
/// let id = WarehouseId::new(7);
/// assert_eq!(id.as_i64(), 7);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(ItemId);
define_id!(OrderId);
define_id!(UserId);

/// Payment transaction ID.
///
/// The payment service returns this as a JSON string (it stringifies its
/// database key), and the gateway form echoes it verbatim in `udf2`, so it
/// stays a string end to end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Create a new payment ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PaymentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PaymentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let product = ProductId::new(1);
        let item = ItemId::new(1);
        assert_eq!(product.as_i64(), item.as_i64());
        // `product == item` would not compile, which is the point.
    }

    #[test]
    fn id_serializes_transparently() {
        let id = OrderId::new(101);
        assert_eq!(serde_json::to_string(&id).unwrap(), "101");

        let back: OrderId = serde_json::from_str("101").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn payment_id_round_trips_as_string() {
        let id: PaymentId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(id.as_str(), "7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }
}
