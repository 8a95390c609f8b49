use std::sync::Arc;

use thiserror::Error;

use stockroom_ledger::{Movement, MovementReader, NewMovement};

/// Ledger store operation error.
///
/// These are **infrastructure errors** (storage, partial writes) as opposed
/// to domain errors (validation, insufficient stock).
#[derive(Debug, Error)]
pub enum LedgerStoreError {
    /// The movement failed shape validation at the store boundary.
    #[error("invalid append: {0}")]
    InvalidAppend(String),

    /// The backing storage failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// A linked pair was partially applied: the first leg is durable, the
    /// second failed. Carries the stored leg so the caller can compensate.
    #[error("linked pair partially applied: {reason}")]
    PartialAppend {
        stored: Box<Movement>,
        reason: String,
    },
}

/// Append-only, (product, outlet)-keyed movement store.
///
/// Streams are ordered by store-assigned sequence numbers: monotonically
/// increasing per key, starting at 1, no gaps. Movements are never modified
/// or deleted once appended.
pub trait LedgerStore: MovementReader {
    /// Validate, assign the next sequence number for the movement's
    /// (product, outlet) stream, persist, and return the stored record.
    fn append(&self, movement: NewMovement) -> Result<Movement, LedgerStoreError>;

    /// Append two linked movements (the legs of a transfer).
    ///
    /// The default implementation performs two single appends; if the second
    /// fails after the first is durable, the error is
    /// [`LedgerStoreError::PartialAppend`] carrying the stored first leg so
    /// the caller can issue a compensating reversal. Implementations that can
    /// make the pair visible atomically should override this.
    fn append_pair(
        &self,
        first: NewMovement,
        second: NewMovement,
    ) -> Result<(Movement, Movement), LedgerStoreError> {
        let stored_first = self.append(first)?;
        match self.append(second) {
            Ok(stored_second) => Ok((stored_first, stored_second)),
            Err(e) => Err(LedgerStoreError::PartialAppend {
                stored: Box::new(stored_first),
                reason: e.to_string(),
            }),
        }
    }
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn append(&self, movement: NewMovement) -> Result<Movement, LedgerStoreError> {
        (**self).append(movement)
    }

    fn append_pair(
        &self,
        first: NewMovement,
        second: NewMovement,
    ) -> Result<(Movement, Movement), LedgerStoreError> {
        (**self).append_pair(first, second)
    }
}
