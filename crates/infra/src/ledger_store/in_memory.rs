use std::collections::HashMap;
use std::sync::RwLock;

use stockroom_core::{OutletId, ProductId};
use stockroom_ledger::{DateRange, Movement, MovementReader, NewMovement};

use super::r#trait::{LedgerStore, LedgerStoreError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    product_id: ProductId,
    outlet_id: OutletId,
}

impl StreamKey {
    fn of(movement: &NewMovement) -> Self {
        Self {
            product_id: movement.product_id,
            outlet_id: movement.outlet_id,
        }
    }
}

/// In-memory append-only ledger store.
///
/// Intended for tests/dev and single-process deployments. The whole store
/// sits behind one `RwLock`, so `append_pair` is naturally atomic: the two
/// legs of a transfer become visible together, never one without the other.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    streams: RwLock<HashMap<StreamKey, Vec<Movement>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_sequence(stream: &[Movement]) -> u64 {
        stream.last().map(|m| m.sequence).unwrap_or(0) + 1
    }

    fn validate(movement: &NewMovement) -> Result<(), LedgerStoreError> {
        movement
            .validate()
            .map_err(|e| LedgerStoreError::InvalidAppend(e.to_string()))
    }
}

impl MovementReader for InMemoryLedgerStore {
    fn movements(
        &self,
        product_id: ProductId,
        outlet_id: OutletId,
        range: &DateRange,
    ) -> Vec<Movement> {
        let streams = match self.streams.read() {
            Ok(s) => s,
            Err(_) => return vec![],
        };

        let key = StreamKey {
            product_id,
            outlet_id,
        };
        let mut movements: Vec<Movement> = streams
            .get(&key)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|m| range.contains(m.occurred_at))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Streams are appended in sequence order, but backdated entries make
        // the (date, sequence) ordering key non-trivial.
        movements.sort_by_key(|m| (m.date(), m.sequence));
        movements
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn append(&self, movement: NewMovement) -> Result<Movement, LedgerStoreError> {
        Self::validate(&movement)?;

        let mut streams = self
            .streams
            .write()
            .map_err(|_| LedgerStoreError::Storage("lock poisoned".to_string()))?;

        let stream = streams.entry(StreamKey::of(&movement)).or_default();
        let stored = movement.into_stored(Self::next_sequence(stream));
        stream.push(stored.clone());
        Ok(stored)
    }

    /// Atomic override: both legs are validated and appended under a single
    /// write lock, so no reader can observe a half-written pair.
    fn append_pair(
        &self,
        first: NewMovement,
        second: NewMovement,
    ) -> Result<(Movement, Movement), LedgerStoreError> {
        Self::validate(&first)?;
        Self::validate(&second)?;

        let mut streams = self
            .streams
            .write()
            .map_err(|_| LedgerStoreError::Storage("lock poisoned".to_string()))?;

        let first_stream = streams.entry(StreamKey::of(&first)).or_default();
        let stored_first = first.into_stored(Self::next_sequence(first_stream));
        first_stream.push(stored_first.clone());

        let second_stream = streams.entry(StreamKey::of(&second)).or_default();
        let stored_second = second.into_stored(Self::next_sequence(second_stream));
        second_stream.push(stored_second.clone());

        Ok((stored_first, stored_second))
    }
}
