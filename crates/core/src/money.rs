//! Non-negative decimal money amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A non-negative decimal amount (unit prices, unit costs, order totals).
///
/// Currency is implicit: the catalog prices everything in one currency.
/// Arithmetic is checked; there is no `Add` impl so nothing can silently
/// overflow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Build a money amount, rejecting negative values.
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::invalid_input(format!(
                "amount must not be negative (got {amount})"
            )));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit amount, `None` for a negative
    /// quantity or when the product exceeds `Decimal` range.
    pub fn checked_times(self, quantity: i64) -> Option<Self> {
        if quantity < 0 {
            return None;
        }
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Like [`Money::checked_times`], reporting why it failed.
    pub fn times(self, quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::invalid_input(format!(
                "quantity must not be negative (got {quantity})"
            )));
        }
        self.checked_times(quantity).ok_or_else(|| {
            DomainError::invalid_input(format!("amount overflows ({self} x {quantity})"))
        })
    }

    pub fn checked_add(self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `Σ unit × quantity`, `None` as soon as any step overflows.
    pub fn checked_total(items: impl IntoIterator<Item = (Money, i64)>) -> Option<Self> {
        items.into_iter().try_fold(Money::ZERO, |acc, (unit, quantity)| {
            acc.checked_add(unit.checked_times(quantity)?)
        })
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
