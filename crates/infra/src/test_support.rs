//! Fixtures shared by this crate's tests.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use grocer_catalog::{InMemoryCatalog, NewProduct};
use grocer_core::{Money, ProductId, SupplierId};
use grocer_inventory::NewLedgerEntry;

use crate::config::LedgerConfig;
use crate::ledger_store::{InMemoryLedgerStore, LedgerStore};

pub(crate) struct Shop {
    pub ledger: Arc<InMemoryLedgerStore>,
    pub catalog: Arc<InMemoryCatalog>,
    pub products: Vec<ProductId>,
    pub supplier: SupplierId,
}

/// One "Groceries" category, one supplier and a product per `(price, stock)`.
pub(crate) async fn shop(stock: &[(Decimal, i64)]) -> Shop {
    shop_with_config(stock, LedgerConfig::default()).await
}

pub(crate) async fn shop_with_config(stock: &[(Decimal, i64)], config: LedgerConfig) -> Shop {
    let ledger = Arc::new(InMemoryLedgerStore::new(config));
    let catalog = Arc::new(InMemoryCatalog::new());
    let category = catalog.add_category("Groceries").unwrap();
    let supplier = catalog.add_supplier("Fresh Farms").unwrap();

    let mut products = Vec::with_capacity(stock.len());
    for (idx, (price, qty)) in stock.iter().enumerate() {
        let product = catalog
            .add_product(NewProduct {
                name: format!("item-{}", idx + 1),
                category_id: category.category_id,
                brand: "House".to_string(),
                unit_price: Money::new(*price).unwrap(),
                unit: "pack".to_string(),
                description: String::new(),
                image_ref: None,
            })
            .unwrap();
        ledger.ensure_product(product.product_id).await.unwrap();
        if *qty > 0 {
            ledger
                .append_entry(NewLedgerEntry::new(
                    product.product_id,
                    *qty,
                    "initial stock",
                    Utc::now(),
                ))
                .await
                .unwrap();
        }
        products.push(product.product_id);
    }

    Shop {
        ledger,
        catalog,
        products,
        supplier: supplier.supplier_id,
    }
}
