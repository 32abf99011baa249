use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use grocer_core::{RestockId, SupplierId};
use grocer_purchasing::{RestockIntent, RestockLine};

use crate::error::LedgerResult;

/// Persistence for restock intents.
///
/// `create` stores the header and every line atomically and assigns a
/// strictly increasing `RestockId`. Lines arrive already validated.
#[async_trait]
pub trait RestockStore: Send + Sync {
    async fn create(
        &self,
        supplier_id: SupplierId,
        order_date: NaiveDate,
        lines: Vec<RestockLine>,
    ) -> LedgerResult<RestockIntent>;

    /// `NotFound` when no intent has this id.
    async fn get(&self, restock_id: RestockId) -> LedgerResult<RestockIntent>;

    /// Every intent, ascending by id.
    async fn list(&self) -> LedgerResult<Vec<RestockIntent>>;
}

#[async_trait]
impl<S> RestockStore for Arc<S>
where
    S: RestockStore + ?Sized,
{
    async fn create(
        &self,
        supplier_id: SupplierId,
        order_date: NaiveDate,
        lines: Vec<RestockLine>,
    ) -> LedgerResult<RestockIntent> {
        (**self).create(supplier_id, order_date, lines).await
    }

    async fn get(&self, restock_id: RestockId) -> LedgerResult<RestockIntent> {
        (**self).get(restock_id).await
    }

    async fn list(&self) -> LedgerResult<Vec<RestockIntent>> {
        (**self).list().await
    }
}
