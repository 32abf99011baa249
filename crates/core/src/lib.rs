//! `grocer-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy shared by every component, and money.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, EntryId, ProductId, RequesterId, RestockId, SupplierId};
pub use money::Money;
