use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use grocer_core::{DomainError, DomainResult, EntryId, ProductId};

/// Longest accepted cause/note.
pub const MAX_NOTE_LEN: usize = 500;

/// One immutable row of the stock audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Assigned in commit order.
    pub entry_id: EntryId,
    pub product_id: ProductId,
    /// Signed quantity change.
    pub delta: i64,
    /// Human-readable cause ("customer purchase", "spoiled", ...).
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Log ordering: newest timestamp first, then highest entry id first.
    pub fn newest_first(a: &LedgerEntry, b: &LedgerEntry) -> Ordering {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then_with(|| b.entry_id.cmp(&a.entry_id))
    }
}

/// A ledger row not yet committed (no identifier yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub product_id: ProductId,
    pub delta: i64,
    pub note: String,
    pub occurred_at: DateTime<Utc>,
}

impl NewLedgerEntry {
    pub fn new(
        product_id: ProductId,
        delta: i64,
        note: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            delta,
            note: note.into(),
            occurred_at,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.delta == 0 {
            return Err(DomainError::invalid_input("delta cannot be zero"));
        }
        if self.note.trim().is_empty() {
            return Err(DomainError::invalid_input("note cannot be empty"));
        }
        if self.note.len() > MAX_NOTE_LEN {
            return Err(DomainError::invalid_input(format!(
                "note exceeds {MAX_NOTE_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Attach the identifier assigned at commit.
    pub fn into_committed(self, entry_id: EntryId) -> LedgerEntry {
        LedgerEntry {
            entry_id,
            product_id: self.product_id,
            delta: self.delta,
            note: self.note,
            occurred_at: self.occurred_at,
        }
    }
}

/// Sum of all deltas recorded for `product_id`.
pub fn ledger_sum<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>, product_id: ProductId) -> i64 {
    entries
        .into_iter()
        .filter(|e| e.product_id == product_id)
        .map(|e| e.delta)
        .sum()
}
