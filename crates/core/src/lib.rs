//! `stockroom-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod reference;

pub use error::{StockError, StockResult};
pub use id::{MenuItemId, MovementId, OutletId, ProductId};
pub use reference::{Outlet, OutletDirectory, Product, ProductCatalog};
