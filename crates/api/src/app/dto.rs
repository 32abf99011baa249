use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use grocer_core::{CategoryId, Money, ProductId, RequesterId, RestockId, SupplierId};
use grocer_inventory::LedgerEntry;
use grocer_purchasing::NewRestockLine;
use grocer_sales::{OrderLine, OrderReceipt, OrderRequest};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct NamedRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub category_id: CategoryId,
    pub brand: String,
    pub unit_price: Decimal,
    pub unit: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Opening stock, recorded as an "initial stock" ledger entry.
    #[serde(default)]
    pub initial_stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub requester_id: RequesterId,
    pub items: Vec<OrderLineRequest>,
}

impl PlaceOrderRequest {
    pub fn into_order(self) -> OrderRequest {
        OrderRequest::new(
            self.requester_id,
            self.items
                .into_iter()
                .map(|i| OrderLine {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub product_id: ProductId,
    pub delta: i64,
    pub note: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerLogQuery {
    pub product_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RestockLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateRestockRequest {
    pub supplier_id: SupplierId,
    pub items: Vec<RestockLineRequest>,
}

impl CreateRestockRequest {
    pub fn lines(&self) -> Vec<NewRestockLine> {
        self.items
            .iter()
            .map(|i| NewRestockLine {
                product_id: i.product_id,
                quantity: i.quantity,
                unit_cost: i.unit_cost,
            })
            .collect()
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub total: Money,
    pub entries: Vec<LedgerEntry>,
}

impl From<OrderReceipt> for OrderResponse {
    fn from(receipt: OrderReceipt) -> Self {
        Self {
            total: receipt.total,
            entries: receipt.entries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RestockCreated {
    pub restock_id: RestockId,
    pub expected_total_cost: Money,
}
