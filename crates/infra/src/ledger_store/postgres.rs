//! Postgres-backed ledger store.
//!
//! Every unit of work is one database transaction:
//!
//! 1. `set_config('lock_timeout', ..., true)` bounds lock waits for this
//!    transaction only
//! 2. `SELECT ... WHERE product_id = ANY($1) ORDER BY product_id FOR UPDATE`
//!    takes the row locks in ascending id order
//! 3. staged entries are inserted into `ledger_entries` and applied to
//!    `stock_records` as `quantity = quantity + delta`
//! 4. `COMMIT`
//!
//! The `CHECK (quantity >= 0)` constraint backs up the in-process
//! arithmetic; a violation surfaces as `IntegrityViolation`. Lock waits that
//! exceed the timeout surface as `55P03` and map to `TransientContention`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument, warn};

use grocer_core::{DomainError, DomainResult, EntryId, ProductId};
use grocer_inventory::{LedgerEntry, NewLedgerEntry, StockRecord, apply_delta};

use super::query::{LedgerFilter, LedgerPage, Pagination};
use super::r#trait::{LedgerStore, StockAudit, StockTransaction, lock_order};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
    config: LedgerConfig,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool, config: LedgerConfig) -> Self {
        Self {
            pool: Arc::new(pool),
            config,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a transaction with this store's lock timeout applied.
    async fn begin_tx(&self) -> LedgerResult<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::from_sqlx("begin_transaction", e))?;

        let timeout = format!("{}ms", self.config.lock_timeout.as_millis());
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(timeout)
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::from_sqlx("set_lock_timeout", e))?;
        Ok(tx)
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn ensure_product(&self, product_id: ProductId) -> LedgerResult<StockRecord> {
        sqlx::query(
            r#"
            INSERT INTO stock_records (product_id, quantity)
            VALUES ($1, 0)
            ON CONFLICT (product_id) DO NOTHING
            "#,
        )
        .bind(product_id.get())
        .execute(&*self.pool)
        .await
        .map_err(|e| LedgerError::from_sqlx("ensure_product", e))?;

        self.stock_record(product_id).await
    }

    #[instrument(skip(self), fields(product_id = %product_id), err(level = "debug"))]
    async fn stock_record(&self, product_id: ProductId) -> LedgerResult<StockRecord> {
        let row = sqlx::query("SELECT product_id, quantity FROM stock_records WHERE product_id = $1")
            .bind(product_id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| LedgerError::from_sqlx("stock_record", e))?;

        match row {
            Some(row) => Ok(StockRow::from_row(&row)
                .map_err(|e| LedgerError::storage(format!("failed to read stock row: {e}")))?
                .into()),
            None => Err(DomainError::not_found(format!("product {product_id}")).into()),
        }
    }

    #[instrument(skip(self, products), fields(product_count = products.len()), err(level = "debug"))]
    async fn begin(&self, products: &[ProductId]) -> LedgerResult<Box<dyn StockTransaction>> {
        let order = lock_order(products);
        if order.is_empty() {
            return Err(DomainError::invalid_input("no products to lock").into());
        }

        let mut tx = self.begin_tx().await?;
        let ids: Vec<i64> = order.iter().map(|p| p.get()).collect();
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity
            FROM stock_records
            WHERE product_id = ANY($1)
            ORDER BY product_id
            FOR UPDATE
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| LedgerError::from_sqlx("lock_stock", e))?;

        let mut working = BTreeMap::new();
        for row in rows {
            let record: StockRecord = StockRow::from_row(&row)
                .map_err(|e| LedgerError::storage(format!("failed to read stock row: {e}")))?
                .into();
            working.insert(record.product_id, record.quantity);
        }

        if let Some(missing) = order.iter().find(|p| !working.contains_key(*p)) {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "rollback after missing product failed");
            }
            return Err(DomainError::not_found(format!("product {missing}")).into());
        }

        Span::current().record("product_count", working.len());
        Ok(Box::new(PostgresTransaction {
            tx,
            working,
            staged: Vec::new(),
        }))
    }

    #[instrument(skip(self), err)]
    async fn list_entries(
        &self,
        filter: &LedgerFilter,
        pagination: Pagination,
    ) -> LedgerResult<LedgerPage> {
        filter.validate()?;
        let product_param: Option<i64> = filter.product_id.map(|p| p.get());

        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM ledger_entries
            WHERE ($1::bigint IS NULL OR product_id = $1)
                AND ($2::timestamptz IS NULL OR occurred_at >= $2)
                AND ($3::timestamptz IS NULL OR occurred_at <= $3)
            "#,
        )
        .bind(product_param)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| LedgerError::from_sqlx("count_entries", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| LedgerError::storage(format!("failed to read count: {e}")))?;

        let rows = sqlx::query(
            r#"
            SELECT entry_id, product_id, delta, note, occurred_at
            FROM ledger_entries
            WHERE ($1::bigint IS NULL OR product_id = $1)
                AND ($2::timestamptz IS NULL OR occurred_at >= $2)
                AND ($3::timestamptz IS NULL OR occurred_at <= $3)
            ORDER BY occurred_at DESC, entry_id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(product_param)
        .bind(filter.from)
        .bind(filter.to)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| LedgerError::from_sqlx("list_entries", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let entry = LedgerEntryRow::from_row(&row)
                .map_err(|e| LedgerError::storage(format!("failed to read ledger row: {e}")))?;
            entries.push(entry.into());
        }

        Ok(LedgerPage::new(entries, total.max(0) as u64, pagination))
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn audit(&self, product_id: ProductId) -> LedgerResult<StockAudit> {
        let mut tx = self.begin_tx().await?;
        let row = sqlx::query(
            r#"
            SELECT
                s.quantity AS on_hand,
                COALESCE((SELECT SUM(l.delta) FROM ledger_entries l WHERE l.product_id = s.product_id), 0)::bigint AS ledger_sum
            FROM stock_records s
            WHERE s.product_id = $1
            FOR SHARE
            "#,
        )
        .bind(product_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| LedgerError::from_sqlx("audit", e))?;
        tx.commit()
            .await
            .map_err(|e| LedgerError::from_sqlx("commit_transaction", e))?;

        let row = row.ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
        let read = |col: &str| -> LedgerResult<i64> {
            row.try_get(col)
                .map_err(|e| LedgerError::storage(format!("failed to read {col}: {e}")))
        };
        Ok(StockAudit {
            product_id,
            on_hand: read("on_hand")?,
            ledger_sum: read("ledger_sum")?,
        })
    }
}

struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
    working: BTreeMap<ProductId, i64>,
    staged: Vec<NewLedgerEntry>,
}

#[async_trait]
impl StockTransaction for PostgresTransaction {
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

    #[instrument(skip_all, fields(staged), err)]
    async fn commit(self: Box<Self>) -> LedgerResult<Vec<LedgerEntry>> {
        let PostgresTransaction { mut tx, staged, .. } = *self;
        Span::current().record("staged", staged.len());

        let mut committed = Vec::with_capacity(staged.len());
        for entry in staged {
            let row = sqlx::query(
                r#"
                INSERT INTO ledger_entries (product_id, delta, note, occurred_at)
                VALUES ($1, $2, $3, $4)
                RETURNING entry_id
                "#,
            )
            .bind(entry.product_id.get())
            .bind(entry.delta)
            .bind(&entry.note)
            .bind(entry.occurred_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| LedgerError::from_sqlx("insert_entry", e))?;

            let entry_id: i64 = row
                .try_get("entry_id")
                .map_err(|e| LedgerError::storage(format!("failed to read entry_id: {e}")))?;

            sqlx::query(
                r#"
                UPDATE stock_records
                SET quantity = quantity + $2, updated_at = NOW()
                WHERE product_id = $1
                "#,
            )
            .bind(entry.product_id.get())
            .bind(entry.delta)
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::from_sqlx("apply_delta", e))?;

            committed.push(entry.into_committed(EntryId::new(entry_id)));
        }

        tx.commit()
            .await
            .map_err(|e| LedgerError::from_sqlx("commit_transaction", e))?;
        Ok(committed)
    }

    async fn rollback(self: Box<Self>) {
        let PostgresTransaction { tx, .. } = *self;
        if let Err(e) = tx.rollback().await {
            warn!(error = %e, "ledger transaction rollback failed");
        }
    }
}

#[derive(Debug)]
struct StockRow {
    product_id: i64,
    quantity: i64,
}

impl<'r> FromRow<'r, PgRow> for StockRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StockRow {
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

impl From<StockRow> for StockRecord {
    fn from(row: StockRow) -> Self {
        StockRecord {
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
        }
    }
}

#[derive(Debug)]
struct LedgerEntryRow {
    entry_id: i64,
    product_id: i64,
    delta: i64,
    note: String,
    occurred_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for LedgerEntryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LedgerEntryRow {
            entry_id: row.try_get("entry_id")?,
            product_id: row.try_get("product_id")?,
            delta: row.try_get("delta")?,
            note: row.try_get("note")?,
            occurred_at: row.try_get("occurred_at")?,
        })
    }
}

impl From<LedgerEntryRow> for LedgerEntry {
    fn from(row: LedgerEntryRow) -> Self {
        LedgerEntry {
            entry_id: EntryId::new(row.entry_id),
            product_id: ProductId::new(row.product_id),
            delta: row.delta,
            note: row.note,
            occurred_at: row.occurred_at,
        }
    }
}
