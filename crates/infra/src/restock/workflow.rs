use chrono::Utc;
use tracing::{info, instrument};

use grocer_catalog::Catalog;
use grocer_core::{DomainError, Money, RestockId, SupplierId};
use grocer_purchasing::{NewRestockIntent, NewRestockLine, RestockIntent, total_cost};

use super::store::RestockStore;
use crate::error::LedgerResult;

/// A freshly persisted intent and the cost priced before it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRestock {
    pub intent: RestockIntent,
    pub expected_total_cost: Money,
}

/// Records supplier orders. Stock levels are left alone.
#[derive(Debug, Clone)]
pub struct RestockWorkflow<R, C> {
    store: R,
    catalog: C,
}

impl<R, C> RestockWorkflow<R, C>
where
    R: RestockStore,
    C: Catalog,
{
    pub fn new(store: R, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Validate the lines and their total cost, confirm the supplier and
    /// every product exist, then persist a `Pending` intent dated today (UTC).
    /// Nothing is stored unless every check passes.
    #[instrument(skip(self, lines), fields(supplier_id = %supplier_id, line_count = lines.len()), err(level = "debug"))]
    pub async fn create_restock_order(
        &self,
        supplier_id: SupplierId,
        lines: Vec<NewRestockLine>,
    ) -> LedgerResult<RecordedRestock> {
        let new = NewRestockIntent {
            supplier_id,
            order_date: Utc::now().date_naive(),
            lines,
        };
        let validated = new.validate()?;
        let expected_total_cost = total_cost(&validated)?;

        if !self.catalog.supplier_exists(supplier_id).await? {
            return Err(DomainError::not_found(format!("supplier {supplier_id}")).into());
        }
        for line in &validated {
            if !self.catalog.product_exists(line.product_id).await? {
                return Err(DomainError::not_found(format!(
                    "line {}: product {}",
                    line.line_no, line.product_id
                ))
                .into());
            }
        }

        let intent = self
            .store
            .create(new.supplier_id, new.order_date, validated)
            .await?;
        info!(restock_id = %intent.restock_id, %expected_total_cost, "restock order recorded");
        Ok(RecordedRestock {
            intent,
            expected_total_cost,
        })
    }

    pub async fn get(&self, restock_id: RestockId) -> LedgerResult<RestockIntent> {
        self.store.get(restock_id).await
    }

    pub async fn list(&self) -> LedgerResult<Vec<RestockIntent>> {
        self.store.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger_store::LedgerStore;
    use crate::restock::InMemoryRestockStore;
    use crate::test_support::shop;
    use grocer_core::ProductId;
    use grocer_purchasing::RestockStatus;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn line(product_id: ProductId, quantity: i64, unit_cost: Decimal) -> NewRestockLine {
        NewRestockLine {
            product_id,
            quantity,
            unit_cost,
        }
    }

    #[tokio::test]
    async fn intent_is_pending_and_stock_is_untouched() {
        let shop = shop(&[(dec!(1.00), 3)]).await;
        let p1 = shop.products[0];
        let workflow = RestockWorkflow::new(Arc::new(InMemoryRestockStore::new()), shop.catalog.clone());

        let recorded = workflow
            .create_restock_order(shop.supplier, vec![line(p1, 50, dec!(0.80))])
            .await
            .unwrap();
        let intent = recorded.intent;

        assert_eq!(intent.status, RestockStatus::Pending);
        assert_eq!(intent.order_date, Utc::now().date_naive());
        assert_eq!(recorded.expected_total_cost.amount(), dec!(40.00));
        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 3);
        assert_eq!(workflow.get(intent.restock_id).await.unwrap(), intent);
    }

    #[tokio::test]
    async fn ids_increase_and_list_is_ascending() {
        let shop = shop(&[(dec!(1.00), 0)]).await;
        let workflow = RestockWorkflow::new(Arc::new(InMemoryRestockStore::new()), shop.catalog.clone());

        let mut ids = Vec::new();
        for qty in 1..=3 {
            let recorded = workflow
                .create_restock_order(shop.supplier, vec![line(shop.products[0], qty, dec!(1))])
                .await
                .unwrap();
            ids.push(recorded.intent.restock_id);
        }
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let listed: Vec<RestockId> = workflow.list().await.unwrap().iter().map(|i| i.restock_id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn unknown_supplier_or_product_is_not_found() {
        let shop = shop(&[(dec!(1.00), 0)]).await;
        let workflow = RestockWorkflow::new(Arc::new(InMemoryRestockStore::new()), shop.catalog.clone());

        let err = workflow
            .create_restock_order(SupplierId::new(42), vec![line(shop.products[0], 1, dec!(1))])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");

        let err = workflow
            .create_restock_order(shop.supplier, vec![line(ProductId::new(42), 1, dec!(1))])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
        assert!(workflow.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_runs_before_lookups() {
        let shop = shop(&[]).await;
        let workflow = RestockWorkflow::new(Arc::new(InMemoryRestockStore::new()), shop.catalog.clone());

        let err = workflow
            .create_restock_order(SupplierId::new(42), vec![])
            .await
            .unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::invalid_input("restock order has no line items"))
        );

        let err = workflow
            .create_restock_order(shop.supplier, vec![line(ProductId::new(1), 5, dec!(-1))])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");

        let err = workflow.get(RestockId::new(1)).await.unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn overflowing_cost_stores_nothing() {
        let shop = shop(&[(dec!(1.00), 0), (dec!(1.00), 0)]).await;
        let workflow = RestockWorkflow::new(Arc::new(InMemoryRestockStore::new()), shop.catalog.clone());

        let err = workflow
            .create_restock_order(
                shop.supplier,
                vec![
                    line(shop.products[0], i64::MAX, Decimal::MAX),
                    line(shop.products[1], 1, dec!(1)),
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&DomainError::invalid_input("restock total cost overflows"))
        );
        assert!(workflow.list().await.unwrap().is_empty());
    }
}
