//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure the ledger core can report to its immediate caller. Storage
/// failures are not part of this taxonomy; they live in the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range request (caller's fault, never retried).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced product, supplier or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Business-rule failure: the named product cannot cover the demand.
    #[error("insufficient stock for product {product_id} (requested {requested}, available {available})")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Applying the change would drive on-hand stock below zero.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// Lock contention or timeout; the whole operation may be retried unchanged.
    #[error("transient contention: {0}")]
    TransientContention(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn insufficient_stock(product_id: ProductId, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            product_id,
            requested,
            available,
        }
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IntegrityViolation(msg.into())
    }

    pub fn contention(msg: impl Into<String>) -> Self {
        Self::TransientContention(msg.into())
    }

    /// Whether the caller may safely retry the whole operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientContention(_))
    }

    /// Stable machine-readable code for adapters.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::IntegrityViolation(_) => "integrity_violation",
            Self::TransientContention(_) => "transient_contention",
        }
    }
}
