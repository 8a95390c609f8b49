//! Append-only stock ledger boundary.
//!
//! This module defines an infrastructure-facing abstraction for appending and
//! scanning (product, outlet)-keyed movement streams without making any
//! storage assumptions.

pub mod in_memory;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use query::{MovementScan, Pagination};
pub use r#trait::{LedgerStore, LedgerStoreError};
