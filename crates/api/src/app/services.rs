//! Service graph shared by every handler.
//!
//! The ledger and restock stores are chosen at startup (in-memory or
//! Postgres); every service above them is wired identically either way. The
//! catalog is always the in-memory one.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use grocer_catalog::{InMemoryCatalog, NewProduct, Product};
use grocer_infra::ledger_store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};
use grocer_infra::restock::{
    InMemoryRestockStore, PostgresRestockStore, RestockStore, RestockWorkflow,
};
use grocer_infra::{
    InventoryAdjuster, InventoryQuery, LedgerConfig, LedgerResult, OrderSettlement,
};
use grocer_inventory::NewLedgerEntry;

pub type SharedLedger = Arc<dyn LedgerStore>;
pub type SharedRestock = Arc<dyn RestockStore>;
pub type SharedCatalog = Arc<InMemoryCatalog>;

#[derive(Clone)]
pub struct AppServices {
    pub catalog: SharedCatalog,
    pub ledger: SharedLedger,
    pub settlement: OrderSettlement<SharedLedger, SharedCatalog>,
    pub adjuster: InventoryAdjuster<SharedLedger>,
    pub query: InventoryQuery<SharedLedger>,
    pub restock: RestockWorkflow<SharedRestock, SharedCatalog>,
}

impl AppServices {
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::wire(
            Arc::new(InMemoryLedgerStore::new(config)),
            Arc::new(InMemoryRestockStore::new()),
        )
    }

    /// Both stores share the one pool.
    pub fn persistent(pool: PgPool, config: LedgerConfig) -> Self {
        Self::wire(
            Arc::new(PostgresLedgerStore::new(pool.clone(), config)),
            Arc::new(PostgresRestockStore::new(pool)),
        )
    }

    /// Add a product to the catalog and register it with inventory, with an
    /// optional opening-stock entry. Returns the product and its quantity.
    ///
    /// If inventory rejects it the catalog row is removed again, so a product
    /// is never listed without a stock row behind it.
    pub async fn register_product(
        &self,
        new: NewProduct,
        initial_stock: Option<i64>,
    ) -> LedgerResult<(Product, i64)> {
        let product = self.catalog.add_product(new)?;
        match self.open_stock(&product, initial_stock.unwrap_or(0)).await {
            Ok(quantity) => Ok((product, quantity)),
            Err(e) => {
                tracing::warn!(
                    product_id = %product.product_id,
                    error = %e,
                    "inventory registration failed, removing catalog product"
                );
                self.catalog.remove_product(product.product_id);
                Err(e)
            }
        }
    }

    async fn open_stock(&self, product: &Product, initial_stock: i64) -> LedgerResult<i64> {
        self.ledger.ensure_product(product.product_id).await?;
        if initial_stock > 0 {
            let entry =
                NewLedgerEntry::new(product.product_id, initial_stock, "initial stock", Utc::now());
            self.ledger.append_entry(entry).await?;
        }
        Ok(initial_stock.max(0))
    }

    fn wire(ledger: SharedLedger, restock: SharedRestock) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        Self {
            settlement: OrderSettlement::new(ledger.clone(), catalog.clone()),
            adjuster: InventoryAdjuster::new(ledger.clone()),
            query: InventoryQuery::new(ledger.clone()),
            restock: RestockWorkflow::new(restock, catalog.clone()),
            catalog,
            ledger,
        }
    }
}
