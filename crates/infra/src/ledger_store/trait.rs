use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use grocer_core::{DomainResult, ProductId};
use grocer_inventory::{LedgerEntry, NewLedgerEntry, StockRecord};

use super::query::{LedgerFilter, LedgerPage, Pagination};
use crate::error::{LedgerError, LedgerResult};

/// Point-in-time comparison of a product's stock row and its ledger.
///
/// Both numbers are read inside one unit of work, so `on_hand == ledger_sum`
/// must hold on every consistent store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAudit {
    pub product_id: ProductId,
    pub on_hand: i64,
    pub ledger_sum: i64,
}

impl StockAudit {
    pub fn is_consistent(&self) -> bool {
        self.on_hand == self.ledger_sum
    }
}

/// Authoritative stock quantities plus the append-only ledger explaining them.
///
/// Every quantity change goes through a [`StockTransaction`]: the caller
/// names the products it will touch up front, the store grants exclusive
/// access to exactly those products (in ascending id order, bounded by the
/// configured lock timeout), and `commit` applies the staged ledger rows and
/// quantity changes as one atomic unit.
///
/// Implementations must:
/// - never expose a negative quantity
/// - keep `quantity == Σ delta` per product at every commit boundary
/// - assign strictly increasing entry ids, in commit order per product
/// - report lock-wait expiry as `TransientContention`
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Make `product_id` known to inventory. Idempotent; new rows start at 0.
    async fn ensure_product(&self, product_id: ProductId) -> LedgerResult<StockRecord>;

    /// Current stock row, `NotFound` when the product was never registered.
    async fn stock_record(&self, product_id: ProductId) -> LedgerResult<StockRecord>;

    async fn get_stock(&self, product_id: ProductId) -> LedgerResult<i64> {
        Ok(self.stock_record(product_id).await?.quantity)
    }

    /// Open a unit of work holding exclusive access to `products`.
    ///
    /// Duplicates are ignored. Fails with `NotFound` for an unregistered
    /// product and `TransientContention` if the locks cannot be acquired in
    /// time.
    async fn begin(&self, products: &[ProductId]) -> LedgerResult<Box<dyn StockTransaction>>;

    /// Record a single validated entry and apply its delta atomically.
    async fn append_entry(&self, entry: NewLedgerEntry) -> LedgerResult<LedgerEntry> {
        entry.validate()?;
        let mut tx = self.begin(&[entry.product_id]).await?;
        if let Err(e) = tx.stage(entry) {
            tx.rollback().await;
            return Err(e);
        }
        tx.commit()
            .await?
            .pop()
            .ok_or_else(|| LedgerError::storage("commit returned no entries"))
    }

    /// Ledger entries matching `filter`, newest first.
    async fn list_entries(
        &self,
        filter: &LedgerFilter,
        pagination: Pagination,
    ) -> LedgerResult<LedgerPage>;

    /// Compare the stock row against the ledger sum for one product.
    async fn audit(&self, product_id: ProductId) -> LedgerResult<StockAudit>;
}

/// An open unit of work over a fixed set of products.
///
/// Dropping a transaction without calling `commit` discards every staged
/// change and releases its locks.
#[async_trait]
pub trait StockTransaction: Send {
    /// Locked quantity plus whatever has been staged in this transaction.
    fn quantity(&self, product_id: ProductId) -> DomainResult<i64>;

    /// Stage one ledger row. The delta is applied to the working quantity
    /// immediately, so a staged change that would go negative fails here with
    /// `IntegrityViolation`.
    fn stage(&mut self, entry: NewLedgerEntry) -> LedgerResult<()>;

    /// Persist every staged row and quantity change, returning the committed
    /// entries in staging order.
    async fn commit(self: Box<Self>) -> LedgerResult<Vec<LedgerEntry>>;

    async fn rollback(self: Box<Self>);
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn ensure_product(&self, product_id: ProductId) -> LedgerResult<StockRecord> {
        (**self).ensure_product(product_id).await
    }

    async fn stock_record(&self, product_id: ProductId) -> LedgerResult<StockRecord> {
        (**self).stock_record(product_id).await
    }

    async fn begin(&self, products: &[ProductId]) -> LedgerResult<Box<dyn StockTransaction>> {
        (**self).begin(products).await
    }

    async fn append_entry(&self, entry: NewLedgerEntry) -> LedgerResult<LedgerEntry> {
        (**self).append_entry(entry).await
    }

    async fn list_entries(
        &self,
        filter: &LedgerFilter,
        pagination: Pagination,
    ) -> LedgerResult<LedgerPage> {
        (**self).list_entries(filter, pagination).await
    }

    async fn audit(&self, product_id: ProductId) -> LedgerResult<StockAudit> {
        (**self).audit(product_id).await
    }
}

/// Sorted, de-duplicated lock order for a set of products.
pub(crate) fn lock_order(products: &[ProductId]) -> Vec<ProductId> {
    let mut ordered = products.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    ordered
}
