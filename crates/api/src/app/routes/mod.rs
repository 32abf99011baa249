use axum::{Router, routing::get};

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod restock;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/products", products::router())
        .route("/stock/:product_id", get(inventory::get_stock))
        .nest("/inventory", inventory::router())
        .nest("/orders", orders::router())
        .nest("/restock", restock::router())
        .merge(catalog::router())
}
