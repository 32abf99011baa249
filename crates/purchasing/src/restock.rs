use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use grocer_core::{DomainError, DomainResult, Money, ProductId, RestockId, SupplierId};

/// Restock intent status lifecycle.
///
/// Only `Pending` is produced here; receiving goods is handled elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum RestockStatus {
    Pending,
}

impl RestockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestockStatus::Pending => "pending",
        }
    }
}

impl core::str::FromStr for RestockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RestockStatus::Pending),
            other => Err(DomainError::invalid_input(format!(
                "unknown restock status '{other}'"
            ))),
        }
    }
}

/// Restock line item as submitted (unit cost not yet validated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRestockLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

/// Validated restock line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockLine {
    /// 1-based position within the intent.
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Money,
}

/// Restock request before it has been assigned an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRestockIntent {
    pub supplier_id: SupplierId,
    pub order_date: NaiveDate,
    pub lines: Vec<NewRestockLine>,
}

impl NewRestockIntent {
    /// Validate every line, reporting the first failed constraint.
    pub fn validate(&self) -> DomainResult<Vec<RestockLine>> {
        if self.lines.is_empty() {
            return Err(DomainError::invalid_input("restock order has no line items"));
        }

        let mut validated = Vec::with_capacity(self.lines.len());
        for (idx, line) in self.lines.iter().enumerate() {
            let line_no = u32::try_from(idx + 1)
                .map_err(|_| DomainError::invalid_input("too many line items"))?;
            if line.quantity <= 0 {
                return Err(DomainError::invalid_input(format!(
                    "line {line_no}: quantity must be positive (got {})",
                    line.quantity
                )));
            }
            if line.unit_cost.is_sign_negative() && !line.unit_cost.is_zero() {
                return Err(DomainError::invalid_input(format!(
                    "line {line_no}: unit cost must not be negative (got {})",
                    line.unit_cost
                )));
            }
            validated.push(RestockLine {
                line_no,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_cost: Money::new(line.unit_cost)?,
            });
        }
        total_cost(&validated)?;
        Ok(validated)
    }
}

/// `Σ quantity × unit_cost`; `InvalidInput` if the sum leaves `Decimal` range.
pub fn total_cost(lines: &[RestockLine]) -> DomainResult<Money> {
    Money::checked_total(lines.iter().map(|l| (l.unit_cost, l.quantity)))
        .ok_or_else(|| DomainError::invalid_input("restock total cost overflows"))
}

/// Recorded supplier order awaiting delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockIntent {
    pub restock_id: RestockId,
    pub supplier_id: SupplierId,
    pub order_date: NaiveDate,
    pub status: RestockStatus,
    pub lines: Vec<RestockLine>,
}

impl RestockIntent {
    /// `Σ quantity × unit_cost` across all lines.
    pub fn expected_total_cost(&self) -> DomainResult<Money> {
        total_cost(&self.lines)
    }
}
