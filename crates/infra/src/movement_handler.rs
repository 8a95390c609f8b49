//! Movement command pipeline (application-level orchestration).
//!
//! The `MovementCommandHandler` is the single writer path into the ledger:
//!
//! ```text
//! Command
//!   ↓
//! 1. Resolve references (product/outlet directories)
//!   ↓
//! 2. Acquire the (product, outlet) key lock(s)
//!   ↓
//! 3. Check the non-negative balance invariant (Out / transfer out-leg)
//!   ↓
//! 4. Append to the ledger store (append-only)
//!   ↓
//! 5. Fold the stored movement(s) into the cached balance
//! ```
//!
//! The unit of serialization is the (product, outlet) key: steps 3-5 run
//! under a per-key lock so a sale-driven Out and a manual Adjustment on the
//! same key cannot race each other's balance update. Transfers take both key
//! locks in a deterministic order.
//!
//! Transfers are not a distributed transaction: a partially applied pair is
//! recovered by appending a compensating reversal of the durable leg. Only
//! when the compensation itself fails does the error escalate to the caller
//! as [`HandlerError::TransferIntegrity`] carrying the orphaned entry id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::{MovementId, OutletDirectory, OutletId, ProductCatalog, ProductId};
use stockroom_ledger::{Balance, DateRange, Movement, MovementKind, MovementReader, NewMovement};

use crate::ledger_store::{LedgerStore, LedgerStoreError};
use crate::projections::{BalanceKey, StockBalanceProjection};
use crate::read_model::KeyedStore;

/// Command handling error.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed command input (deterministic rejection).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The movement would drive the balance negative without an override.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// Partial transfer write whose compensation also failed; the orphaned
    /// entry id is surfaced for manual reconciliation.
    #[error("transfer integrity failure: orphaned movement {orphaned}")]
    TransferIntegrity { orphaned: MovementId },

    /// Unknown product or outlet reference.
    #[error("not found: {0}")]
    NotFound(String),

    /// The ledger store failed.
    #[error("ledger store failure: {0}")]
    Store(LedgerStoreError),
}

impl From<LedgerStoreError> for HandlerError {
    fn from(value: LedgerStoreError) -> Self {
        match value {
            LedgerStoreError::InvalidAppend(msg) => HandlerError::Validation(msg),
            other => HandlerError::Store(other),
        }
    }
}

/// Command: goods received at an outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIn {
    pub product_id: ProductId,
    pub outlet_id: OutletId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    pub actor: Option<String>,
}

/// Command: goods leaving an outlet (sale fulfillment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOut {
    pub product_id: ProductId,
    pub outlet_id: OutletId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    pub actor: Option<String>,
    /// Administrative override: allow the balance to go negative.
    pub allow_negative: bool,
}

/// Command: manual correction; quantity is signed as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAdjustment {
    pub product_id: ProductId,
    pub outlet_id: OutletId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    pub actor: Option<String>,
}

/// Command: relocate stock between two outlets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTransfer {
    pub product_id: ProductId,
    pub source_outlet_id: OutletId,
    pub dest_outlet_id: OutletId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
    pub actor: Option<String>,
    /// Administrative override for the out-leg's balance check.
    pub allow_negative: bool,
}

/// Registry of per-(product, outlet) write locks.
#[derive(Debug, Default)]
struct KeyLocks {
    inner: Mutex<HashMap<BalanceKey, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    fn for_key(&self, key: BalanceKey) -> Arc<Mutex<()>> {
        let mut registry = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        registry.entry(key).or_default().clone()
    }
}

/// Validates and appends movements, maintaining the cached balance.
///
/// Generic over the ledger store and the balance read-model store so tests
/// can inject in-memory (or deliberately failing) implementations.
pub struct MovementCommandHandler<S, B>
where
    S: LedgerStore,
    B: KeyedStore<BalanceKey, Balance>,
{
    store: S,
    balances: StockBalanceProjection<B>,
    products: Arc<dyn ProductCatalog>,
    outlets: Arc<dyn OutletDirectory>,
    locks: KeyLocks,
}

impl<S, B> MovementCommandHandler<S, B>
where
    S: LedgerStore,
    B: KeyedStore<BalanceKey, Balance>,
{
    pub fn new(
        store: S,
        balances: StockBalanceProjection<B>,
        products: Arc<dyn ProductCatalog>,
        outlets: Arc<dyn OutletDirectory>,
    ) -> Self {
        Self {
            store,
            balances,
            products,
            outlets,
            locks: KeyLocks::default(),
        }
    }

    /// Record a goods receipt.
    pub fn record_in(&self, cmd: RecordIn) -> Result<Movement, HandlerError> {
        self.ensure_refs(cmd.product_id, cmd.outlet_id)?;
        let key = BalanceKey::new(cmd.product_id, cmd.outlet_id);

        let lock = self.locks.for_key(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let stored = self.store.append(NewMovement {
            id: MovementId::new(),
            product_id: cmd.product_id,
            outlet_id: cmd.outlet_id,
            kind: MovementKind::In,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
            related_movement_id: None,
            note: cmd.note,
            actor: cmd.actor,
        })?;
        self.balances.apply(&stored);

        tracing::debug!(
            product = %stored.product_id,
            outlet = %stored.outlet_id,
            quantity = stored.quantity,
            "recorded stock in"
        );
        Ok(stored)
    }

    /// Record a goods issue (sale fulfillment).
    ///
    /// Fails with [`HandlerError::InsufficientStock`] when the resulting
    /// balance would go negative, unless `allow_negative` is set.
    pub fn record_out(&self, cmd: RecordOut) -> Result<Movement, HandlerError> {
        self.ensure_refs(cmd.product_id, cmd.outlet_id)?;
        let key = BalanceKey::new(cmd.product_id, cmd.outlet_id);

        let lock = self.locks.for_key(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let available = self.current_value(key);
        if !cmd.allow_negative && available < cmd.quantity {
            tracing::debug!(
                product = %cmd.product_id,
                outlet = %cmd.outlet_id,
                requested = cmd.quantity,
                available,
                "rejected stock out"
            );
            return Err(HandlerError::InsufficientStock {
                requested: cmd.quantity,
                available,
            });
        }

        let stored = self.store.append(NewMovement {
            id: MovementId::new(),
            product_id: cmd.product_id,
            outlet_id: cmd.outlet_id,
            kind: MovementKind::Out,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
            related_movement_id: None,
            note: cmd.note,
            actor: cmd.actor,
        })?;
        self.balances.apply(&stored);

        tracing::debug!(
            product = %stored.product_id,
            outlet = %stored.outlet_id,
            quantity = stored.quantity,
            "recorded stock out"
        );
        Ok(stored)
    }

    /// Record a manual correction.
    ///
    /// Adjustments are the administrative correction instrument: the signed
    /// quantity is applied as given and is not subject to the non-negative
    /// balance check.
    pub fn record_adjustment(&self, cmd: RecordAdjustment) -> Result<Movement, HandlerError> {
        self.ensure_refs(cmd.product_id, cmd.outlet_id)?;
        let key = BalanceKey::new(cmd.product_id, cmd.outlet_id);

        let lock = self.locks.for_key(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let stored = self.store.append(NewMovement {
            id: MovementId::new(),
            product_id: cmd.product_id,
            outlet_id: cmd.outlet_id,
            kind: MovementKind::Adjustment,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
            related_movement_id: None,
            note: cmd.note,
            actor: cmd.actor,
        })?;
        self.balances.apply(&stored);

        tracing::debug!(
            product = %stored.product_id,
            outlet = %stored.outlet_id,
            quantity = stored.quantity,
            "recorded adjustment"
        );
        Ok(stored)
    }

    /// Relocate stock: atomically create two linked entries sharing one
    /// `related_movement_id`, a `TransferOut` at the source and a
    /// `TransferIn` at the destination.
    pub fn record_transfer(&self, cmd: RecordTransfer) -> Result<(Movement, Movement), HandlerError> {
        self.ensure_product(cmd.product_id)?;
        self.ensure_outlet(cmd.source_outlet_id)?;
        self.ensure_outlet(cmd.dest_outlet_id)?;
        if cmd.source_outlet_id == cmd.dest_outlet_id {
            return Err(HandlerError::Validation(
                "transfer requires a distinct counterpart outlet".to_string(),
            ));
        }
        if cmd.quantity <= 0 {
            return Err(HandlerError::Validation(format!(
                "quantity must be positive, got {}",
                cmd.quantity
            )));
        }

        let source_key = BalanceKey::new(cmd.product_id, cmd.source_outlet_id);
        let dest_key = BalanceKey::new(cmd.product_id, cmd.dest_outlet_id);

        // Deterministic two-key lock order prevents transfer deadlock.
        let (first_key, second_key) = if source_key <= dest_key {
            (source_key, dest_key)
        } else {
            (dest_key, source_key)
        };
        let first_lock = self.locks.for_key(first_key);
        let _first_guard = first_lock.lock().unwrap_or_else(|e| e.into_inner());
        let second_lock = self.locks.for_key(second_key);
        let _second_guard = second_lock.lock().unwrap_or_else(|e| e.into_inner());

        let available = self.current_value(source_key);
        if !cmd.allow_negative && available < cmd.quantity {
            return Err(HandlerError::InsufficientStock {
                requested: cmd.quantity,
                available,
            });
        }

        let link = MovementId::new();
        let out_leg = NewMovement {
            id: MovementId::new(),
            product_id: cmd.product_id,
            outlet_id: cmd.source_outlet_id,
            kind: MovementKind::TransferOut,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
            related_movement_id: Some(link),
            note: cmd.note.clone(),
            actor: cmd.actor.clone(),
        };
        let in_leg = NewMovement {
            id: MovementId::new(),
            product_id: cmd.product_id,
            outlet_id: cmd.dest_outlet_id,
            kind: MovementKind::TransferIn,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
            related_movement_id: Some(link),
            note: cmd.note.clone(),
            actor: cmd.actor.clone(),
        };

        match self.store.append_pair(out_leg, in_leg) {
            Ok((stored_out, stored_in)) => {
                self.balances.apply(&stored_out);
                self.balances.apply(&stored_in);
                tracing::debug!(
                    product = %cmd.product_id,
                    source = %cmd.source_outlet_id,
                    dest = %cmd.dest_outlet_id,
                    quantity = cmd.quantity,
                    "recorded transfer"
                );
                Ok((stored_out, stored_in))
            }
            Err(LedgerStoreError::PartialAppend { stored, reason }) => {
                // The out-leg is durable; keep the cache consistent with the
                // ledger before attempting compensation.
                self.balances.apply(&stored);
                tracing::warn!(
                    product = %cmd.product_id,
                    source = %cmd.source_outlet_id,
                    orphaned = %stored.id,
                    reason,
                    "transfer pair partially applied, compensating"
                );
                self.compensate_out_leg(&stored, link, &cmd, reason)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reverse a durable out-leg whose in-leg failed to persist.
    fn compensate_out_leg(
        &self,
        stored_out: &Movement,
        link: MovementId,
        cmd: &RecordTransfer,
        reason: String,
    ) -> Result<(Movement, Movement), HandlerError> {
        let reversal = NewMovement {
            id: MovementId::new(),
            product_id: cmd.product_id,
            outlet_id: cmd.source_outlet_id,
            kind: MovementKind::TransferIn,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
            related_movement_id: Some(link),
            note: Some("compensating reversal of partial transfer".to_string()),
            actor: cmd.actor.clone(),
        };

        match self.store.append(reversal) {
            Ok(compensation) => {
                self.balances.apply(&compensation);
                // All-or-nothing from the caller's perspective: the transfer
                // failed, the ledger nets to zero.
                Err(HandlerError::Store(LedgerStoreError::Storage(reason)))
            }
            Err(e) => {
                tracing::error!(
                    orphaned = %stored_out.id,
                    error = %e,
                    "transfer compensation failed, manual reconciliation required"
                );
                Err(HandlerError::TransferIntegrity {
                    orphaned: stored_out.id,
                })
            }
        }
    }

    /// Cached balance for one key, rebuilding from the ledger on a cold miss.
    pub fn read_balance(&self, product_id: ProductId, outlet_id: OutletId) -> Balance {
        let key = BalanceKey::new(product_id, outlet_id);
        let lock = self.locks.for_key(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        match self.balances.read_cached(product_id, outlet_id) {
            Some(balance) => balance,
            None => self.balances.recompute(&self.store, product_id, outlet_id),
        }
    }

    /// Full replay for one key (audit/repair path).
    pub fn recompute_balance(&self, product_id: ProductId, outlet_id: OutletId) -> Balance {
        let key = BalanceKey::new(product_id, outlet_id);
        let lock = self.locks.for_key(key);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        self.balances.recompute(&self.store, product_id, outlet_id)
    }

    /// Movements for one key within a range (query passthrough).
    pub fn movements(
        &self,
        product_id: ProductId,
        outlet_id: OutletId,
        range: &DateRange,
    ) -> Vec<Movement> {
        self.store.movements(product_id, outlet_id, range)
    }

    /// The maintained balance projection (query surface).
    pub fn balances(&self) -> &StockBalanceProjection<B> {
        &self.balances
    }

    fn current_value(&self, key: BalanceKey) -> i64 {
        match self.balances.read_cached(key.product_id, key.outlet_id) {
            Some(balance) => balance.value,
            None => self
                .balances
                .recompute(&self.store, key.product_id, key.outlet_id)
                .value,
        }
    }

    fn ensure_refs(&self, product_id: ProductId, outlet_id: OutletId) -> Result<(), HandlerError> {
        self.ensure_product(product_id)?;
        self.ensure_outlet(outlet_id)
    }

    fn ensure_product(&self, product_id: ProductId) -> Result<(), HandlerError> {
        if self.products.get(product_id).is_none() {
            return Err(HandlerError::NotFound(format!("product {product_id}")));
        }
        Ok(())
    }

    fn ensure_outlet(&self, outlet_id: OutletId) -> Result<(), HandlerError> {
        if self.outlets.get(outlet_id).is_none() {
            return Err(HandlerError::NotFound(format!("outlet {outlet_id}")));
        }
        Ok(())
    }
}
