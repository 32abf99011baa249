//! Supplier restock intents.
//!
//! Recording an intent never changes on-hand stock.

pub mod in_memory;
pub mod postgres;
pub mod store;
pub mod workflow;

pub use in_memory::InMemoryRestockStore;
pub use postgres::PostgresRestockStore;
pub use store::RestockStore;
pub use workflow::{RecordedRestock, RestockWorkflow};
