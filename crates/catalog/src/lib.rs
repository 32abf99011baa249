//! Catalog collaborator boundary.
//!
//! The ledger core only ever asks the catalog three things: does a product
//! exist, what does it cost right now, and does a supplier exist. This crate
//! defines that boundary (`Catalog`) plus a small in-memory catalog so the
//! system can run end-to-end without an external product service.

pub mod in_memory;
pub mod product;

pub use in_memory::InMemoryCatalog;
pub use product::{
    Catalog, Category, NewProduct, PriceSort, Product, ProductFilter, Supplier,
};
