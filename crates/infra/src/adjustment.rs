//! Manual stock corrections (spoilage, damage, counts).

use chrono::Utc;
use tracing::{info, instrument, warn};

use grocer_core::{DomainError, ProductId};
use grocer_inventory::{LedgerEntry, NewLedgerEntry};

use crate::error::LedgerResult;
use crate::ledger_store::LedgerStore;

#[derive(Debug, Clone)]
pub struct InventoryAdjuster<L> {
    ledger: L,
}

impl<L> InventoryAdjuster<L>
where
    L: LedgerStore,
{
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Record one signed correction. Goes through the same unit of work as
    /// checkout; a result below zero is rejected, never clamped.
    #[instrument(skip(self, note), err(level = "debug"))]
    pub async fn adjust(
        &self,
        product_id: ProductId,
        delta: i64,
        note: &str,
    ) -> LedgerResult<LedgerEntry> {
        let entry = NewLedgerEntry::new(product_id, delta, note.trim(), Utc::now());
        match self.ledger.append_entry(entry).await {
            Ok(entry) => {
                info!(entry_id = %entry.entry_id, "stock adjusted");
                Ok(entry)
            }
            Err(e) => {
                if matches!(e.as_domain(), Some(DomainError::IntegrityViolation(_))) {
                    warn!(error = %e, "adjustment rejected");
                }
                Err(e)
            }
        }
    }
}
