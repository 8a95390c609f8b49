//! Paginated, lazy scans over movement streams.
//!
//! Unbounded date ranges can cover arbitrarily long histories; reporting
//! callers go through [`MovementScan`] so only one batch is held at a time.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use stockroom_core::{OutletId, ProductId};
use stockroom_ledger::{DateRange, Movement, MovementReader};

/// Pagination parameters for ledger queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of movements to return.
    pub limit: u32,
    /// Offset into the (date, sequence)-ordered stream (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000),
            offset: offset.unwrap_or(0),
        }
    }
}

/// One page of a movement stream.
pub fn page<R>(
    reader: &R,
    product_id: ProductId,
    outlet_id: OutletId,
    range: &DateRange,
    pagination: Pagination,
) -> Vec<Movement>
where
    R: MovementReader,
{
    reader
        .movements(product_id, outlet_id, range)
        .into_iter()
        .skip(pagination.offset as usize)
        .take(pagination.limit as usize)
        .collect()
}

/// Lazy, finite, restartable scan over one movement stream.
///
/// Pulls batches of `batch_size` on demand; restart by constructing a new
/// scan with the same arguments.
#[derive(Debug)]
pub struct MovementScan<'a, R> {
    reader: &'a R,
    product_id: ProductId,
    outlet_id: OutletId,
    range: DateRange,
    batch: VecDeque<Movement>,
    offset: u32,
    batch_size: u32,
    exhausted: bool,
}

impl<'a, R> MovementScan<'a, R>
where
    R: MovementReader,
{
    pub fn new(
        reader: &'a R,
        product_id: ProductId,
        outlet_id: OutletId,
        range: DateRange,
        batch_size: u32,
    ) -> Self {
        Self {
            reader,
            product_id,
            outlet_id,
            range,
            batch: VecDeque::new(),
            offset: 0,
            batch_size: batch_size.clamp(1, 1000),
            exhausted: false,
        }
    }

    fn refill(&mut self) {
        let pagination = Pagination {
            limit: self.batch_size,
            offset: self.offset,
        };
        let batch = page(
            self.reader,
            self.product_id,
            self.outlet_id,
            &self.range,
            pagination,
        );
        if (batch.len() as u32) < self.batch_size {
            self.exhausted = true;
        }
        self.offset += batch.len() as u32;
        self.batch = batch.into();
    }
}

impl<R> Iterator for MovementScan<'_, R>
where
    R: MovementReader,
{
    type Item = Movement;

    fn next(&mut self) -> Option<Movement> {
        if self.batch.is_empty() && !self.exhausted {
            self.refill();
        }
        self.batch.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::ledger_store::{InMemoryLedgerStore, LedgerStore};
    use stockroom_core::MovementId;
    use stockroom_ledger::{MovementKind, NewMovement};

    fn seeded_store(count: u64) -> (InMemoryLedgerStore, ProductId, OutletId) {
        let store = InMemoryLedgerStore::new();
        let (product, outlet) = (ProductId::new(), OutletId::new());
        for i in 0..count {
            store
                .append(NewMovement {
                    id: MovementId::new(),
                    product_id: product,
                    outlet_id: outlet,
                    kind: MovementKind::In,
                    quantity: i as i64 + 1,
                    occurred_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                    related_movement_id: None,
                    note: None,
                    actor: None,
                })
                .unwrap();
        }
        (store, product, outlet)
    }

    #[test]
    fn scan_visits_every_movement_in_order() {
        let (store, product, outlet) = seeded_store(120);
        let scan = MovementScan::new(&store, product, outlet, DateRange::unbounded(), 50);

        let sequences: Vec<u64> = scan.map(|m| m.sequence).collect();
        assert_eq!(sequences, (1..=120).collect::<Vec<u64>>());
    }

    #[test]
    fn scan_is_restartable() {
        let (store, product, outlet) = seeded_store(7);
        let first: Vec<u64> =
            MovementScan::new(&store, product, outlet, DateRange::unbounded(), 3)
                .map(|m| m.sequence)
                .collect();
        let second: Vec<u64> =
            MovementScan::new(&store, product, outlet, DateRange::unbounded(), 3)
                .map(|m| m.sequence)
                .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn scan_over_empty_stream_ends_immediately() {
        let store = InMemoryLedgerStore::new();
        let mut scan = MovementScan::new(
            &store,
            ProductId::new(),
            OutletId::new(),
            DateRange::unbounded(),
            10,
        );
        assert!(scan.next().is_none());
    }

    #[test]
    fn page_respects_limit_and_offset() {
        let (store, product, outlet) = seeded_store(10);
        let page = page(
            &store,
            product,
            outlet,
            &DateRange::unbounded(),
            Pagination {
                limit: 3,
                offset: 4,
            },
        );
        let sequences: Vec<u64> = page.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![5, 6, 7]);
    }
}
