//! All-or-nothing stock reservation.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

use grocer_core::DomainError;
use grocer_inventory::{LedgerEntry, NewLedgerEntry, ReservationLine, aggregate_demand};

use crate::error::LedgerResult;
use crate::ledger_store::LedgerStore;

/// Decrements stock for a multi-line request inside one unit of work.
///
/// Either every product is decremented by its full aggregated demand and one
/// ledger entry per product is committed, or nothing is written at all.
#[derive(Debug, Clone)]
pub struct ReservationEngine<L> {
    ledger: L,
}

impl<L> ReservationEngine<L>
where
    L: LedgerStore,
{
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Reserve every line or none.
    ///
    /// Products are checked in ascending id order, so the reported
    /// `InsufficientStock` is always the lowest-id product that falls short.
    #[instrument(skip(self, lines), fields(line_count = lines.len(), cause = %cause), err(level = "debug"))]
    pub async fn reserve(
        &self,
        lines: &[ReservationLine],
        cause: &str,
        occurred_at: DateTime<Utc>,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        let demand = aggregate_demand(lines)?;
        let products: Vec<_> = demand.keys().copied().collect();

        let mut tx = self.ledger.begin(&products).await?;
        for (&product_id, &requested) in &demand {
            let available = match tx.quantity(product_id) {
                Ok(q) => q,
                Err(e) => {
                    tx.rollback().await;
                    return Err(e.into());
                }
            };
            if available < requested {
                tx.rollback().await;
                debug!(%product_id, requested, available, "reservation rejected");
                return Err(DomainError::insufficient_stock(product_id, requested, available).into());
            }
        }

        for (&product_id, &requested) in &demand {
            let staged = tx.stage(NewLedgerEntry::new(product_id, -requested, cause, occurred_at));
            if let Err(e) = staged {
                if matches!(e.as_domain(), Some(DomainError::IntegrityViolation(_))) {
                    warn!(%product_id, error = %e, "reservation would break stock invariant");
                }
                tx.rollback().await;
                return Err(e);
            }
        }

        let entries = tx.commit().await?;
        debug!(products = entries.len(), "reservation committed");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger_store::{InMemoryLedgerStore, LedgerFilter, Pagination};
    use grocer_core::ProductId;
    use std::sync::Arc;

    fn p(id: i64) -> ProductId {
        ProductId::new(id)
    }

    fn line(product: i64, quantity: i64) -> ReservationLine {
        ReservationLine::new(p(product), quantity)
    }

    async fn engine_with(stock: &[(i64, i64)]) -> ReservationEngine<Arc<InMemoryLedgerStore>> {
        let store = Arc::new(InMemoryLedgerStore::default());
        for (id, qty) in stock {
            store.ensure_product(p(*id)).await.unwrap();
            store
                .append_entry(NewLedgerEntry::new(p(*id), *qty, "initial stock", Utc::now()))
                .await
                .unwrap();
        }
        ReservationEngine::new(store)
    }

    #[tokio::test]
    async fn reserves_every_line() {
        let engine = engine_with(&[(1, 10), (2, 5)]).await;
        let entries = engine
            .reserve(&[line(2, 5), line(1, 4)], "customer purchase", Utc::now())
            .await
            .unwrap();

        let deltas: Vec<(i64, i64)> = entries.iter().map(|e| (e.product_id.get(), e.delta)).collect();
        assert_eq!(deltas, vec![(1, -4), (2, -5)]);
        assert_eq!(engine.ledger().get_stock(p(1)).await.unwrap(), 6);
        assert_eq!(engine.ledger().get_stock(p(2)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn shortfall_leaves_everything_untouched() {
        let engine = engine_with(&[(1, 10), (2, 5)]).await;
        let err = engine
            .reserve(&[line(1, 4), line(2, 20)], "customer purchase", Utc::now())
            .await
            .unwrap_err();

        assert_eq!(
            err.as_domain(),
            Some(&DomainError::insufficient_stock(p(2), 20, 5))
        );
        assert_eq!(engine.ledger().get_stock(p(1)).await.unwrap(), 10);
        let page = engine
            .ledger()
            .list_entries(&LedgerFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn duplicate_lines_are_aggregated() {
        let engine = engine_with(&[(1, 10)]).await;
        let err = engine
            .reserve(&[line(1, 6), line(1, 6)], "customer purchase", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::insufficient_stock(p(1), 12, 10))
        );

        let entries = engine
            .reserve(&[line(1, 3), line(1, 2)], "customer purchase", Utc::now())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delta, -5);
    }

    #[tokio::test]
    async fn lowest_product_id_is_reported_first() {
        let engine = engine_with(&[(1, 1), (2, 1)]).await;
        let err = engine
            .reserve(&[line(2, 5), line(1, 5)], "customer purchase", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::insufficient_stock(p(1), 5, 1))
        );
    }

    #[tokio::test]
    async fn invalid_lines_touch_nothing() {
        let engine = engine_with(&[(1, 10)]).await;
        let err = engine.reserve(&[], "customer purchase", Utc::now()).await.unwrap_err();
        assert_eq!(err.code(), "invalid_input");

        let err = engine
            .reserve(&[line(1, 0)], "customer purchase", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");

        let err = engine
            .reserve(&[line(7, 1)], "customer purchase", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
        assert_eq!(engine.ledger().get_stock(p(1)).await.unwrap(), 10);
    }
}
