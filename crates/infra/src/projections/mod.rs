//! Projection implementations (read model builders).
//!
//! Projections fold the append-only ledger into query-optimized read models.
//! All projections are:
//! - **Rebuildable**: Can be reconstructed from the movement stream
//! - **Idempotent**: Safe for at-least-once application

pub mod stock_balance;

pub use stock_balance::{BalanceKey, StockBalanceProjection};
