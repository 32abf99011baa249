//! Stock quantities and the append-only ledger that explains them.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use query::{LedgerFilter, LedgerPage, Pagination};
pub use r#trait::{LedgerStore, StockAudit, StockTransaction};
