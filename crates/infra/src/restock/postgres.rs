//! Postgres-backed restock store (`restock_orders` + `restock_items`).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use grocer_core::{DomainError, Money, ProductId, RestockId, SupplierId};
use grocer_purchasing::{RestockIntent, RestockLine, RestockStatus};

use super::store::RestockStore;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone)]
pub struct PostgresRestockStore {
    pool: Arc<PgPool>,
}

impl PostgresRestockStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn load_lines(&self, restock_ids: &[i64]) -> LedgerResult<BTreeMap<i64, Vec<RestockLine>>> {
        let rows = sqlx::query(
            r#"
            SELECT restock_id, line_no, product_id, quantity, unit_cost
            FROM restock_items
            WHERE restock_id = ANY($1)
            ORDER BY restock_id, line_no
            "#,
        )
        .bind(restock_ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| LedgerError::from_sqlx("load_restock_items", e))?;

        let mut lines: BTreeMap<i64, Vec<RestockLine>> = BTreeMap::new();
        for row in rows {
            let item = RestockItemRow::from_row(&row)
                .map_err(|e| LedgerError::storage(format!("failed to read restock item: {e}")))?;
            let restock_id = item.restock_id;
            lines.entry(restock_id).or_default().push(item.try_into()?);
        }
        Ok(lines)
    }
}

#[async_trait]
impl RestockStore for PostgresRestockStore {
    #[instrument(skip(self, lines), fields(supplier_id = %supplier_id, line_count = lines.len()), err)]
    async fn create(
        &self,
        supplier_id: SupplierId,
        order_date: NaiveDate,
        lines: Vec<RestockLine>,
    ) -> LedgerResult<RestockIntent> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| LedgerError::from_sqlx("begin_transaction", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO restock_orders (supplier_id, order_date, status)
            VALUES ($1, $2, $3)
            RETURNING restock_id
            "#,
        )
        .bind(supplier_id.get())
        .bind(order_date)
        .bind(RestockStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| LedgerError::from_sqlx("insert_restock_order", e))?;

        let restock_id: i64 = row
            .try_get("restock_id")
            .map_err(|e| LedgerError::storage(format!("failed to read restock_id: {e}")))?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO restock_items (restock_id, line_no, product_id, quantity, unit_cost)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(restock_id)
            .bind(line.line_no as i32)
            .bind(line.product_id.get())
            .bind(line.quantity)
            .bind(line.unit_cost.amount())
            .execute(&mut *tx)
            .await
            .map_err(|e| LedgerError::from_sqlx("insert_restock_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| LedgerError::from_sqlx("commit_transaction", e))?;

        Ok(RestockIntent {
            restock_id: RestockId::new(restock_id),
            supplier_id,
            order_date,
            status: RestockStatus::Pending,
            lines,
        })
    }

    #[instrument(skip(self), fields(restock_id = %restock_id), err(level = "debug"))]
    async fn get(&self, restock_id: RestockId) -> LedgerResult<RestockIntent> {
        let row = sqlx::query(
            r#"
            SELECT restock_id, supplier_id, order_date, status
            FROM restock_orders
            WHERE restock_id = $1
            "#,
        )
        .bind(restock_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| LedgerError::from_sqlx("get_restock_order", e))?
        .ok_or_else(|| DomainError::not_found(format!("restock order {restock_id}")))?;

        let header = RestockOrderRow::from_row(&row)
            .map_err(|e| LedgerError::storage(format!("failed to read restock order: {e}")))?;
        let mut lines = self.load_lines(&[header.restock_id]).await?;
        let items = lines.remove(&header.restock_id).unwrap_or_default();
        header.into_intent(items)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> LedgerResult<Vec<RestockIntent>> {
        let rows = sqlx::query(
            r#"
            SELECT restock_id, supplier_id, order_date, status
            FROM restock_orders
            ORDER BY restock_id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| LedgerError::from_sqlx("list_restock_orders", e))?;

        let mut headers = Vec::with_capacity(rows.len());
        for row in rows {
            headers.push(
                RestockOrderRow::from_row(&row)
                    .map_err(|e| LedgerError::storage(format!("failed to read restock order: {e}")))?,
            );
        }

        let ids: Vec<i64> = headers.iter().map(|h| h.restock_id).collect();
        let mut lines = self.load_lines(&ids).await?;
        headers
            .into_iter()
            .map(|h| {
                let items = lines.remove(&h.restock_id).unwrap_or_default();
                h.into_intent(items)
            })
            .collect()
    }
}

#[derive(Debug)]
struct RestockOrderRow {
    restock_id: i64,
    supplier_id: i64,
    order_date: NaiveDate,
    status: String,
}

impl<'r> FromRow<'r, PgRow> for RestockOrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RestockOrderRow {
            restock_id: row.try_get("restock_id")?,
            supplier_id: row.try_get("supplier_id")?,
            order_date: row.try_get("order_date")?,
            status: row.try_get("status")?,
        })
    }
}

impl RestockOrderRow {
    fn into_intent(self, lines: Vec<RestockLine>) -> LedgerResult<RestockIntent> {
        Ok(RestockIntent {
            restock_id: RestockId::new(self.restock_id),
            supplier_id: SupplierId::new(self.supplier_id),
            order_date: self.order_date,
            status: self.status.parse::<RestockStatus>()?,
            lines,
        })
    }
}

#[derive(Debug)]
struct RestockItemRow {
    restock_id: i64,
    line_no: i32,
    product_id: i64,
    quantity: i64,
    unit_cost: Decimal,
}

impl<'r> FromRow<'r, PgRow> for RestockItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RestockItemRow {
            restock_id: row.try_get("restock_id")?,
            line_no: row.try_get("line_no")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            unit_cost: row.try_get("unit_cost")?,
        })
    }
}

impl TryFrom<RestockItemRow> for RestockLine {
    type Error = LedgerError;

    fn try_from(row: RestockItemRow) -> Result<Self, Self::Error> {
        let line_no = u32::try_from(row.line_no)
            .map_err(|_| LedgerError::storage(format!("invalid line_no {}", row.line_no)))?;
        Ok(RestockLine {
            line_no,
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            unit_cost: Money::new(row.unit_cost)?,
        })
    }
}
