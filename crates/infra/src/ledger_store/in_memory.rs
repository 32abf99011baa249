use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::{Instant, timeout_at};

use grocer_core::{DomainError, DomainResult, EntryId, ProductId};
use grocer_inventory::{LedgerEntry, NewLedgerEntry, StockRecord, apply_delta, ledger_sum};

use super::query::{LedgerFilter, LedgerPage, Pagination};
use super::r#trait::{LedgerStore, StockAudit, StockTransaction, lock_order};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};

/// A product's quantity: the lock writers hold for the length of a
/// transaction, plus the last committed value for lock-free reads.
#[derive(Debug, Default)]
struct StockCell {
    lock: Arc<AsyncMutex<i64>>,
    committed: AtomicI64,
}

impl StockCell {
    fn snapshot(&self) -> i64 {
        self.committed.load(Ordering::Acquire)
    }

    fn publish(&self, quantity: i64) {
        self.committed.store(quantity, Ordering::Release);
    }
}

type CellGuard = (OwnedMutexGuard<i64>, Arc<StockCell>);

#[derive(Debug, Default)]
struct LedgerLog {
    entries: Vec<LedgerEntry>,
    next_id: i64,
}

/// In-memory ledger store for tests and single-process deployments.
///
/// Each product's quantity lives behind its own async mutex; a transaction
/// owns the guards for every product it touches until it commits or is
/// dropped. Stock reads never wait on those guards: they see the value
/// published by the last commit. The log is a plain append-only vector
/// guarded separately and only ever locked after the product guards.
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    cells: RwLock<BTreeMap<ProductId, Arc<StockCell>>>,
    log: Arc<Mutex<LedgerLog>>,
    config: LedgerConfig,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl InMemoryLedgerStore {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            cells: RwLock::new(BTreeMap::new()),
            log: Arc::new(Mutex::new(LedgerLog {
                entries: Vec::new(),
                next_id: 1,
            })),
            config,
        }
    }

    fn cell(&self, product_id: ProductId) -> LedgerResult<Arc<StockCell>> {
        let cells = self
            .cells
            .read()
            .map_err(|_| LedgerError::storage("stock table lock poisoned"))?;
        cells
            .get(&product_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")).into())
    }

    async fn lock_cell(
        &self,
        product_id: ProductId,
        deadline: Instant,
    ) -> LedgerResult<OwnedMutexGuard<i64>> {
        let cell = self.cell(product_id)?;
        wait_for(product_id, &cell, deadline).await
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.config.lock_timeout
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn ensure_product(&self, product_id: ProductId) -> LedgerResult<StockRecord> {
        {
            let mut cells = self
                .cells
                .write()
                .map_err(|_| LedgerError::storage("stock table lock poisoned"))?;
            cells
                .entry(product_id)
                .or_insert_with(|| Arc::new(StockCell::default()));
        }
        self.stock_record(product_id).await
    }

    async fn stock_record(&self, product_id: ProductId) -> LedgerResult<StockRecord> {
        let cell = self.cell(product_id)?;
        Ok(StockRecord {
            product_id,
            quantity: cell.snapshot(),
        })
    }

    async fn begin(&self, products: &[ProductId]) -> LedgerResult<Box<dyn StockTransaction>> {
        let order = lock_order(products);
        if order.is_empty() {
            return Err(DomainError::invalid_input("no products to lock").into());
        }

        // Resolve every cell before waiting on any of them so an unknown
        // product fails fast without holding locks.
        let cells = order
            .iter()
            .map(|p| self.cell(*p).map(|c| (*p, c)))
            .collect::<LedgerResult<Vec<_>>>()?;

        let deadline = self.deadline();
        let mut guards = BTreeMap::new();
        let mut working = BTreeMap::new();
        for (product_id, cell) in cells {
            let guard = wait_for(product_id, &cell, deadline).await?;
            working.insert(product_id, *guard);
            guards.insert(product_id, (guard, cell));
        }

        tracing::trace!(products = ?order, "stock locks acquired");
        Ok(Box::new(InMemoryTransaction {
            guards,
            working,
            staged: Vec::new(),
            log: Arc::clone(&self.log),
        }))
    }

    async fn list_entries(
        &self,
        filter: &LedgerFilter,
        pagination: Pagination,
    ) -> LedgerResult<LedgerPage> {
        filter.validate()?;
        let mut matching: Vec<LedgerEntry> = {
            let log = self
                .log
                .lock()
                .map_err(|_| LedgerError::storage("ledger log lock poisoned"))?;
            log.entries
                .iter()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect()
        };
        matching.sort_by(LedgerEntry::newest_first);

        let total = matching.len() as u64;
        let entries = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok(LedgerPage::new(entries, total, pagination))
    }

    async fn audit(&self, product_id: ProductId) -> LedgerResult<StockAudit> {
        let guard = self.lock_cell(product_id, self.deadline()).await?;
        let log = self
            .log
            .lock()
            .map_err(|_| LedgerError::storage("ledger log lock poisoned"))?;
        Ok(StockAudit {
            product_id,
            on_hand: *guard,
            ledger_sum: ledger_sum(&log.entries, product_id),
        })
    }
}

async fn wait_for(
    product_id: ProductId,
    cell: &StockCell,
    deadline: Instant,
) -> LedgerResult<OwnedMutexGuard<i64>> {
    timeout_at(deadline, Arc::clone(&cell.lock).lock_owned())
        .await
        .map_err(|_| {
            DomainError::contention(format!(
                "timed out waiting for stock lock on product {product_id}"
            ))
            .into()
        })
}

struct InMemoryTransaction {
    guards: BTreeMap<ProductId, CellGuard>,
    working: BTreeMap<ProductId, i64>,
    staged: Vec<NewLedgerEntry>,
    log: Arc<Mutex<LedgerLog>>,
}

#[async_trait]
impl StockTransaction for InMemoryTransaction {
    fn quantity(&self, product_id: ProductId) -> DomainResult<i64> {
        self.working.get(&product_id).copied().ok_or_else(|| {
            DomainError::invalid_input(format!("product {product_id} is not part of this transaction"))
        })
    }

    fn stage(&mut self, entry: NewLedgerEntry) -> LedgerResult<()> {
        entry.validate()?;
        let current = self.quantity(entry.product_id)?;
        let next = apply_delta(entry.product_id, current, entry.delta)?;
        self.working.insert(entry.product_id, next);
        self.staged.push(entry);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<Vec<LedgerEntry>> {
        let InMemoryTransaction {
            mut guards,
            working,
            staged,
            log,
        } = *self;
        let mut log = log
            .lock()
            .map_err(|_| LedgerError::storage("ledger log lock poisoned"))?;

        let mut committed = Vec::with_capacity(staged.len());
        for entry in staged {
            let entry_id = EntryId::new(log.next_id);
            log.next_id += 1;
            committed.push(entry.into_committed(entry_id));
        }
        log.entries.extend(committed.iter().cloned());

        for (product_id, (guard, cell)) in guards.iter_mut() {
            if let Some(quantity) = working.get(product_id) {
                **guard = *quantity;
                cell.publish(*quantity);
            }
        }
        Ok(committed)
    }

    async fn rollback(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn p(id: i64) -> ProductId {
        ProductId::new(id)
    }

    async fn store_with(stock: &[(i64, i64)]) -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::default();
        for (id, qty) in stock {
            store.ensure_product(p(*id)).await.unwrap();
            if *qty != 0 {
                store
                    .append_entry(NewLedgerEntry::new(p(*id), *qty, "initial stock", Utc::now()))
                    .await
                    .unwrap();
            }
        }
        store
    }

    #[tokio::test]
    async fn ensure_product_is_idempotent() {
        let store = store_with(&[(1, 7)]).await;
        let record = store.ensure_product(p(1)).await.unwrap();
        assert_eq!(record.quantity, 7);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = InMemoryLedgerStore::default();
        let err = store.get_stock(p(9)).await.unwrap_err();
        assert_eq!(err.code(), "not_found");
        let err = store.begin(&[p(9)]).await.err().unwrap();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn entry_ids_follow_commit_order() {
        let store = store_with(&[(1, 10), (2, 4)]).await;
        let entry = store
            .append_entry(NewLedgerEntry::new(p(2), -1, "spoiled", Utc::now()))
            .await
            .unwrap();
        assert_eq!(entry.entry_id, EntryId::new(3));
    }

    #[tokio::test]
    async fn dropped_transaction_changes_nothing() {
        let store = store_with(&[(1, 10)]).await;
        {
            let mut tx = store.begin(&[p(1)]).await.unwrap();
            tx.stage(NewLedgerEntry::new(p(1), -4, "customer purchase", Utc::now()))
                .unwrap();
            assert_eq!(tx.quantity(p(1)).unwrap(), 6);
        }
        assert_eq!(store.get_stock(p(1)).await.unwrap(), 10);
        let page = store
            .list_entries(&LedgerFilter::for_product(p(1)), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn staging_below_zero_is_rejected() {
        let store = store_with(&[(1, 2)]).await;
        let mut tx = store.begin(&[p(1)]).await.unwrap();
        let err = tx
            .stage(NewLedgerEntry::new(p(1), -3, "damaged", Utc::now()))
            .unwrap_err();
        assert_eq!(err.code(), "integrity_violation");
    }

    #[tokio::test]
    async fn held_lock_times_out_as_contention() {
        let store = InMemoryLedgerStore::new(LedgerConfig {
            lock_timeout: Duration::from_millis(50),
        });
        store.ensure_product(p(1)).await.unwrap();
        let _held = store.begin(&[p(1)]).await.unwrap();

        let err = store.begin(&[p(1)]).await.err().unwrap();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn stock_reads_do_not_wait_on_open_transactions() {
        let store = InMemoryLedgerStore::new(LedgerConfig {
            lock_timeout: Duration::from_millis(50),
        });
        store.ensure_product(p(1)).await.unwrap();
        store
            .append_entry(NewLedgerEntry::new(p(1), 10, "initial stock", Utc::now()))
            .await
            .unwrap();

        let mut tx = store.begin(&[p(1)]).await.unwrap();
        tx.stage(NewLedgerEntry::new(p(1), -4, "customer purchase", Utc::now()))
            .unwrap();

        // Held well past the lock timeout: the read still answers with the
        // last committed quantity.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.get_stock(p(1)).await.unwrap(), 10);

        tx.commit().await.unwrap();
        assert_eq!(store.get_stock(p(1)).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn audit_matches_ledger() {
        let store = store_with(&[(1, 10)]).await;
        store
            .append_entry(NewLedgerEntry::new(p(1), -3, "spoiled", Utc::now()))
            .await
            .unwrap();
        let audit = store.audit(p(1)).await.unwrap();
        assert_eq!(audit.on_hand, 7);
        assert!(audit.is_consistent());
    }
}
