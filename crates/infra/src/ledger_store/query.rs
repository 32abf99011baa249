//! Ledger log query types.
//!
//! Log reads are stateless: a page is addressed by `offset`/`limit` only, so
//! a client can restart a listing at any point without server-side cursors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use grocer_core::{DomainError, DomainResult, ProductId};
use grocer_inventory::LedgerEntry;

/// Pagination parameters for log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of entries to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 1000;

    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Filter criteria for the ledger log. Time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub product_id: Option<ProductId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl LedgerFilter {
    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(DomainError::invalid_input(
                    "time range start must not be after its end",
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.product_id.is_none_or(|p| entry.product_id == p)
            && self.from.is_none_or(|from| entry.occurred_at >= from)
            && self.to.is_none_or(|to| entry.occurred_at <= to)
    }
}

/// One page of the log, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    /// Entries matching the filter across all pages.
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

impl LedgerPage {
    pub fn new(entries: Vec<LedgerEntry>, total: u64, pagination: Pagination) -> Self {
        let has_more = total > u64::from(pagination.offset) + entries.len() as u64;
        Self {
            entries,
            total,
            pagination,
            has_more,
        }
    }
}
