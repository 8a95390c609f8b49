//! In-memory reference-data directories for tests/dev.
//!
//! Production deployments adapt these traits to whatever system owns product
//! and outlet administration.

use std::collections::HashMap;
use std::sync::RwLock;

use stockroom_core::{Outlet, OutletDirectory, OutletId, Product, ProductCatalog, ProductId};

#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.id, product);
        }
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn get(&self, id: ProductId) -> Option<Product> {
        let products = self.products.read().ok()?;
        products.get(&id).cloned()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOutletDirectory {
    outlets: RwLock<HashMap<OutletId, Outlet>>,
}

impl InMemoryOutletDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, outlet: Outlet) {
        if let Ok(mut outlets) = self.outlets.write() {
            outlets.insert(outlet.id, outlet);
        }
    }
}

impl OutletDirectory for InMemoryOutletDirectory {
    fn get(&self, id: OutletId) -> Option<Outlet> {
        let outlets = self.outlets.read().ok()?;
        outlets.get(&id).cloned()
    }
}
