//! Read-only access to stock and its ledger.
//!
//! These reads take no long-lived locks and may be stale by the time the
//! caller looks at them; nothing on the checkout path consults them.

use serde::{Deserialize, Serialize};

use grocer_core::ProductId;
use grocer_inventory::StockLevel;

use crate::error::LedgerResult;
use crate::ledger_store::{LedgerFilter, LedgerPage, LedgerStore, Pagination};

/// Stock quantity plus its storefront band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockView {
    pub product_id: ProductId,
    pub quantity: i64,
    pub level: StockLevel,
}

#[derive(Debug, Clone)]
pub struct InventoryQuery<L> {
    ledger: L,
}

impl<L> InventoryQuery<L>
where
    L: LedgerStore,
{
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub async fn current_stock(&self, product_id: ProductId) -> LedgerResult<i64> {
        self.ledger.get_stock(product_id).await
    }

    pub async fn stock_view(&self, product_id: ProductId) -> LedgerResult<StockView> {
        let record = self.ledger.stock_record(product_id).await?;
        Ok(StockView {
            product_id,
            quantity: record.quantity,
            level: record.level(),
        })
    }

    pub async fn log(&self, filter: &LedgerFilter, pagination: Pagination) -> LedgerResult<LedgerPage> {
        self.ledger.list_entries(filter, pagination).await
    }
}
