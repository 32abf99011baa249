//! Purchasing domain module: supplier restock intents.
//!
//! A restock intent records what was ordered from a supplier. It never
//! changes on-hand stock; arrival is a separate lifecycle stage.

pub mod restock;

pub use restock::{
    NewRestockIntent, NewRestockLine, RestockIntent, RestockLine, RestockStatus, total_cost,
};
