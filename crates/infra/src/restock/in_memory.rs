use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;

use grocer_core::{DomainError, RestockId, SupplierId};
use grocer_purchasing::{RestockIntent, RestockLine, RestockStatus};

use super::store::RestockStore;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Default)]
struct RestockState {
    intents: BTreeMap<RestockId, RestockIntent>,
    last_id: i64,
}

/// In-memory restock store.
#[derive(Debug, Default)]
pub struct InMemoryRestockStore {
    inner: RwLock<RestockState>,
}

impl InMemoryRestockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RestockStore for InMemoryRestockStore {
    async fn create(
        &self,
        supplier_id: SupplierId,
        order_date: NaiveDate,
        lines: Vec<RestockLine>,
    ) -> LedgerResult<RestockIntent> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::storage("restock lock poisoned"))?;
        state.last_id += 1;
        let intent = RestockIntent {
            restock_id: RestockId::new(state.last_id),
            supplier_id,
            order_date,
            status: RestockStatus::Pending,
            lines,
        };
        state.intents.insert(intent.restock_id, intent.clone());
        Ok(intent)
    }

    async fn get(&self, restock_id: RestockId) -> LedgerResult<RestockIntent> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::storage("restock lock poisoned"))?;
        state
            .intents
            .get(&restock_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("restock order {restock_id}")).into())
    }

    async fn list(&self) -> LedgerResult<Vec<RestockIntent>> {
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::storage("restock lock poisoned"))?;
        Ok(state.intents.values().cloned().collect())
    }
}
