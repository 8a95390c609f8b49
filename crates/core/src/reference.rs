//! Immutable reference data consumed by the engine.
//!
//! Products and outlets are owned by external administration; the engine
//! treats them as read-only lookups behind the directory traits.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::id::{OutletId, ProductId};

/// A product: raw material or finished good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Smallest unit of measure the ledger counts in (e.g. "g", "ml", "pcs").
    pub unit: String,
    pub category: Option<String>,
}

/// An outlet: a physical stock location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlet {
    pub id: OutletId,
    pub name: String,
}

/// Read-only product lookup (external collaborator).
pub trait ProductCatalog: Send + Sync {
    fn get(&self, id: ProductId) -> Option<Product>;
}

/// Read-only outlet lookup (external collaborator).
pub trait OutletDirectory: Send + Sync {
    fn get(&self, id: OutletId) -> Option<Outlet>;
}

impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    fn get(&self, id: ProductId) -> Option<Product> {
        (**self).get(id)
    }
}

impl<S> OutletDirectory for Arc<S>
where
    S: OutletDirectory + ?Sized,
{
    fn get(&self, id: OutletId) -> Option<Outlet> {
        (**self).get(id)
    }
}
