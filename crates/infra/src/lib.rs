//! Infrastructure layer: ledger stores, the services built on them, DB and
//! config wiring.

pub mod adjustment;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger_store;
pub mod query;
pub mod reservation;
pub mod restock;
pub mod settlement;

pub use adjustment::InventoryAdjuster;
pub use config::{AppConfig, ConfigError, DatabaseConfig, LedgerConfig};
pub use error::{LedgerError, LedgerResult};
pub use query::{InventoryQuery, StockView};
pub use reservation::ReservationEngine;
pub use settlement::OrderSettlement;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod test_support;
