use stockroom_core::{OutletId, ProductId};
use stockroom_ledger::{Balance, DateRange, Movement, MovementReader};

use crate::read_model::KeyedStore;

/// Read-model key: one balance per (product, outlet).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BalanceKey {
    pub product_id: ProductId,
    pub outlet_id: OutletId,
}

impl BalanceKey {
    pub fn new(product_id: ProductId, outlet_id: OutletId) -> Self {
        Self {
            product_id,
            outlet_id,
        }
    }

    fn of(movement: &Movement) -> Self {
        Self::new(movement.product_id, movement.outlet_id)
    }
}

/// Current-balance projection over the movement ledger.
///
/// Maintains one [`Balance`] per (product, outlet). The cached value is a
/// disposable read model: it must always equal the fold of the stream up to
/// its `as_of_sequence`, and can be rebuilt from the ledger at any time.
#[derive(Debug)]
pub struct StockBalanceProjection<S>
where
    S: KeyedStore<BalanceKey, Balance>,
{
    store: S,
}

impl<S> StockBalanceProjection<S>
where
    S: KeyedStore<BalanceKey, Balance>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The maintained projection for one key, if any movement has been
    /// applied or recomputed for it.
    pub fn read_cached(&self, product_id: ProductId, outlet_id: OutletId) -> Option<Balance> {
        self.store.get(&BalanceKey::new(product_id, outlet_id))
    }

    /// All cached balances (reporting).
    pub fn list(&self) -> Vec<Balance> {
        self.store.list()
    }

    /// Fold one stored movement into the cached balance.
    ///
    /// Idempotent for at-least-once application: movements at or below the
    /// cached watermark are ignored.
    pub fn apply(&self, movement: &Movement) {
        let key = BalanceKey::of(movement);
        let mut balance = self
            .store
            .get(&key)
            .unwrap_or_else(|| Balance::zero(key.product_id, key.outlet_id));
        balance.apply(movement);
        self.store.upsert(key, balance);
    }

    /// Full replay for one key: deterministic fold of the whole stream in
    /// ledger order, overwriting the cache (audit/repair path).
    pub fn recompute<R>(&self, ledger: &R, product_id: ProductId, outlet_id: OutletId) -> Balance
    where
        R: MovementReader,
    {
        let stream = ledger.movements(product_id, outlet_id, &DateRange::unbounded());
        let balance = Balance::replay(product_id, outlet_id, &stream);
        self.store
            .upsert(BalanceKey::new(product_id, outlet_id), balance.clone());
        balance
    }

    /// Drop every cached balance (full rebuild support).
    pub fn reset(&self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::ledger_store::{InMemoryLedgerStore, LedgerStore};
    use crate::read_model::InMemoryKeyedStore;
    use stockroom_core::MovementId;
    use stockroom_ledger::{MovementKind, NewMovement};

    fn projection() -> StockBalanceProjection<InMemoryKeyedStore<BalanceKey, Balance>> {
        StockBalanceProjection::new(InMemoryKeyedStore::new())
    }

    fn append(
        store: &InMemoryLedgerStore,
        product: ProductId,
        outlet: OutletId,
        kind: MovementKind,
        quantity: i64,
    ) -> Movement {
        store
            .append(NewMovement {
                id: MovementId::new(),
                product_id: product,
                outlet_id: outlet,
                kind,
                quantity,
                occurred_at: Utc::now(),
                related_movement_id: None,
                note: None,
                actor: None,
            })
            .unwrap()
    }

    #[test]
    fn incremental_apply_tracks_the_stream() {
        let store = InMemoryLedgerStore::new();
        let projection = projection();
        let (product, outlet) = (ProductId::new(), OutletId::new());

        for (kind, qty) in [
            (MovementKind::In, 10),
            (MovementKind::Out, 4),
            (MovementKind::Adjustment, -2),
        ] {
            let stored = append(&store, product, outlet, kind, qty);
            projection.apply(&stored);
        }

        let cached = projection.read_cached(product, outlet).unwrap();
        assert_eq!(cached.value, 4);
        assert_eq!(cached.as_of_sequence, 3);
    }

    #[test]
    fn duplicate_apply_is_a_no_op() {
        let store = InMemoryLedgerStore::new();
        let projection = projection();
        let (product, outlet) = (ProductId::new(), OutletId::new());

        let stored = append(&store, product, outlet, MovementKind::In, 10);
        projection.apply(&stored);
        projection.apply(&stored);

        assert_eq!(projection.read_cached(product, outlet).unwrap().value, 10);
    }

    #[test]
    fn recompute_matches_incremental_cache() {
        let store = InMemoryLedgerStore::new();
        let projection = projection();
        let (product, outlet) = (ProductId::new(), OutletId::new());

        for (kind, qty) in [
            (MovementKind::In, 50),
            (MovementKind::Out, 20),
            (MovementKind::In, 5),
            (MovementKind::Adjustment, -7),
        ] {
            let stored = append(&store, product, outlet, kind, qty);
            projection.apply(&stored);
        }
        let cached = projection.read_cached(product, outlet).unwrap();

        let replayed = projection.recompute(&store, product, outlet);
        assert_eq!(replayed.value, cached.value);
        assert_eq!(replayed.as_of_sequence, cached.as_of_sequence);
    }

    #[test]
    fn recompute_on_empty_stream_yields_zero() {
        let store = InMemoryLedgerStore::new();
        let projection = projection();
        let (product, outlet) = (ProductId::new(), OutletId::new());

        let balance = projection.recompute(&store, product, outlet);
        assert_eq!(balance.value, 0);
        assert_eq!(balance.as_of_sequence, 0);
    }
}
