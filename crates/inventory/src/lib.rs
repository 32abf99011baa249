//! Inventory ledger domain module.
//!
//! This crate contains the business rules for stock and its audit log,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). Stores in `grocer-infra` call into these rules inside their
//! atomic units of work.

pub mod ledger;
pub mod reservation;
pub mod stock;

pub use ledger::{LedgerEntry, NewLedgerEntry, ledger_sum};
pub use reservation::{ReservationLine, aggregate_demand};
pub use stock::{StockLevel, StockRecord, apply_delta};
