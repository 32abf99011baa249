use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use grocer_core::{DomainError, DomainResult, Money, ProductId, RequesterId};
use grocer_inventory::{LedgerEntry, ReservationLine};

/// Ledger cause recorded for every checkout decrement.
pub const CUSTOMER_PURCHASE: &str = "customer purchase";

/// One requested line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Ephemeral checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub requester_id: RequesterId,
    pub lines: Vec<OrderLine>,
}

impl OrderRequest {
    pub fn new(requester_id: RequesterId, lines: Vec<OrderLine>) -> Self {
        Self {
            requester_id,
            lines,
        }
    }

    /// Shape checks only; stock sufficiency is decided by the reservation.
    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::invalid_input("order has no items"));
        }
        for (idx, line) in self.lines.iter().enumerate() {
            if line.quantity <= 0 {
                return Err(DomainError::invalid_input(format!(
                    "line {}: quantity must be positive (product {}, got {})",
                    idx + 1,
                    line.product_id,
                    line.quantity
                )));
            }
        }
        Ok(())
    }

    pub fn reservation_lines(&self) -> Vec<ReservationLine> {
        self.lines
            .iter()
            .map(|l| ReservationLine::new(l.product_id, l.quantity))
            .collect()
    }
}

/// An order line with the unit price resolved from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedLine {
    pub fn line_total(&self) -> DomainResult<Money> {
        self.unit_price.times(self.quantity)
    }

    /// `Σ unit_price × quantity` over all lines.
    pub fn total(lines: &[PricedLine]) -> DomainResult<Money> {
        Money::checked_total(lines.iter().map(|l| (l.unit_price, l.quantity)))
            .ok_or_else(|| DomainError::invalid_input("order total overflows"))
    }
}

/// Outcome of a settled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub requester_id: RequesterId,
    pub total: Money,
    pub lines: Vec<PricedLine>,
    /// Ledger rows written by the reservation, one per distinct product.
    pub entries: Vec<LedgerEntry>,
    pub placed_at: DateTime<Utc>,
}
