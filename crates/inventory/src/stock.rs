use serde::{Deserialize, Serialize};

use grocer_core::{DomainError, DomainResult, ProductId};

/// Current on-hand quantity of one product.
///
/// Invariant: `quantity >= 0`, and equals the sum of every ledger delta ever
/// recorded for `product_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl StockRecord {
    /// A product newly known to inventory starts at zero.
    pub fn empty(product_id: ProductId) -> Self {
        Self {
            product_id,
            quantity: 0,
        }
    }

    pub fn level(&self) -> StockLevel {
        StockLevel::classify(self.quantity)
    }
}

/// Apply a signed delta to an on-hand quantity.
///
/// Fails with `IntegrityViolation` when the result would be negative (or
/// would overflow); this is the single arithmetic rule every store enforces.
pub fn apply_delta(product_id: ProductId, current: i64, delta: i64) -> DomainResult<i64> {
    let next = current.checked_add(delta).ok_or_else(|| {
        DomainError::integrity(format!("stock overflow for product {product_id}"))
    })?;
    if next < 0 {
        return Err(DomainError::integrity(format!(
            "stock cannot go negative for product {product_id} (on hand {current}, delta {delta})"
        )));
    }
    Ok(next)
}

/// Display band for storefront stock indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    /// 1..=5 units.
    Low,
    /// 6..=15 units.
    Limited,
    InStock,
}

impl StockLevel {
    pub const LOW_THRESHOLD: i64 = 5;
    pub const LIMITED_THRESHOLD: i64 = 15;

    pub fn classify(quantity: i64) -> Self {
        match quantity {
            q if q <= 0 => StockLevel::OutOfStock,
            q if q <= Self::LOW_THRESHOLD => StockLevel::Low,
            q if q <= Self::LIMITED_THRESHOLD => StockLevel::Limited,
            _ => StockLevel::InStock,
        }
    }
}
