//! Checkout: price an order and reserve its stock.

use chrono::Utc;
use tracing::{info, instrument};

use grocer_catalog::Catalog;
use grocer_sales::{CUSTOMER_PURCHASE, OrderReceipt, OrderRequest, PricedLine};

use crate::error::LedgerResult;
use crate::reservation::ReservationEngine;

#[derive(Debug, Clone)]
pub struct OrderSettlement<L, C> {
    engine: ReservationEngine<L>,
    catalog: C,
}

impl<L, C> OrderSettlement<L, C>
where
    L: crate::ledger_store::LedgerStore,
    C: Catalog,
{
    pub fn new(ledger: L, catalog: C) -> Self {
        Self {
            engine: ReservationEngine::new(ledger),
            catalog,
        }
    }

    /// Validate, price, then reserve.
    ///
    /// Prices are read from the catalog before any lock is taken; an unknown
    /// product fails with `NotFound` and nothing is reserved. The total is
    /// computed over the submitted lines, so duplicated products are charged
    /// once per line.
    #[instrument(
        skip(self, order),
        fields(requester_id = %order.requester_id, line_count = order.lines.len()),
        err(level = "debug")
    )]
    pub async fn place_order(&self, order: &OrderRequest) -> LedgerResult<OrderReceipt> {
        order.validate()?;

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let unit_price = self.catalog.unit_price(line.product_id).await?;
            lines.push(PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            });
        }
        let total = PricedLine::total(&lines)?;

        let placed_at = Utc::now();
        let entries = self
            .engine
            .reserve(&order.reservation_lines(), CUSTOMER_PURCHASE, placed_at)
            .await?;

        info!(%total, entries = entries.len(), "order settled");
        Ok(OrderReceipt {
            requester_id: order.requester_id,
            total,
            lines,
            entries,
            placed_at,
        })
    }
}
