//! Strongly-typed identifiers used across the domain.
//!
//! All identifiers are 64-bit integers assigned by the owning store. Keeping
//! them distinct types stops a supplier id from being passed where a product
//! id is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a catalog product (also the StockRecord key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

/// Identifier of a catalog category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(i64);

/// Identifier of a supplier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplierId(i64);

/// Identifier of the customer placing an order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(i64);

/// Identifier of a ledger entry, assigned in commit order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

/// Identifier of a restock intent, assigned in creation order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestockId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_input(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(ProductId, "ProductId");
impl_int_newtype!(CategoryId, "CategoryId");
impl_int_newtype!(SupplierId, "SupplierId");
impl_int_newtype!(RequesterId, "RequesterId");
impl_int_newtype!(EntryId, "EntryId");
impl_int_newtype!(RestockId, "RestockId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_orders_by_value() {
        let a: ProductId = "7".parse().unwrap();
        let b: ProductId = " 12 ".parse().unwrap();
        assert!(a < b);
        assert_eq!(b.get(), 12);
    }

    #[test]
    fn parse_failure_is_invalid_input() {
        let err = "abc".parse::<SupplierId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(msg) if msg.starts_with("SupplierId")));
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&RestockId::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
