use std::sync::Arc;

use stockroom_core::{OutletId, ProductId};

use crate::movement::{DateRange, Movement};

/// Read-only access to one (product, outlet) movement stream.
///
/// The seam between the ledger store and pure consumers (balance replay,
/// capacity planning). Implementations return movements ascending by
/// (date, sequence); re-issuing the call restarts the scan.
pub trait MovementReader: Send + Sync {
    fn movements(
        &self,
        product_id: ProductId,
        outlet_id: OutletId,
        range: &DateRange,
    ) -> Vec<Movement>;
}

impl<S> MovementReader for Arc<S>
where
    S: MovementReader + ?Sized,
{
    fn movements(
        &self,
        product_id: ProductId,
        outlet_id: OutletId,
        range: &DateRange,
    ) -> Vec<Movement> {
        (**self).movements(product_id, outlet_id, range)
    }
}
