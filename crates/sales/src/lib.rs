//! Sales domain module: customer orders against the stock ledger.
//!
//! An order is not persisted as an entity. Its outcome is the ledger entries
//! written by the reservation plus the total computed here.

pub mod order;

pub use order::{CUSTOMER_PURCHASE, OrderLine, OrderReceipt, OrderRequest, PricedLine};
