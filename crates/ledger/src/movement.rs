use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{MovementId, OutletId, ProductId, StockError};

/// Kind of a stock movement.
///
/// This is a **closed** variant set: every kind participates exhaustively in
/// the balance fold, so a new kind cannot silently bypass balance arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received (restock, purchase receipt).
    In,
    /// Goods leaving (sale fulfillment).
    Out,
    /// Manual correction; quantity is signed as given.
    Adjustment,
    /// Debit half of a relocation between outlets.
    TransferOut,
    /// Credit half of a relocation between outlets.
    TransferIn,
}

impl MovementKind {
    /// Signed balance delta contributed by a movement of this kind.
    ///
    /// `In`/`TransferIn` add, `Out`/`TransferOut` subtract, `Adjustment`
    /// carries its own sign.
    pub fn signed_delta(self, quantity: i64) -> i64 {
        match self {
            MovementKind::In => quantity,
            MovementKind::Out => -quantity,
            MovementKind::Adjustment => quantity,
            MovementKind::TransferOut => -quantity,
            MovementKind::TransferIn => quantity,
        }
    }

    pub fn is_transfer(self) -> bool {
        matches!(self, MovementKind::TransferOut | MovementKind::TransferIn)
    }
}

/// A stored ledger movement (assigned a sequence number).
///
/// **Immutable once appended** — corrections are new compensating entries,
/// never edits or deletes. Ordered within its (product, outlet) stream by
/// (calendar date of `occurred_at`, `sequence`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub outlet_id: OutletId,
    pub kind: MovementKind,
    /// Quantity in the product's smallest unit of measure. Strictly positive
    /// magnitude for all kinds; signed as given for `Adjustment`.
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    /// Monotonically increasing position in the (product, outlet) stream,
    /// assigned by the store during append.
    pub sequence: u64,
    /// Links the two halves of a transfer pair.
    pub related_movement_id: Option<MovementId>,
    pub note: Option<String>,
    pub actor: Option<String>,
}

impl Movement {
    /// Signed balance delta of this movement.
    pub fn signed_delta(&self) -> i64 {
        self.kind.signed_delta(self.quantity)
    }

    /// Calendar date component of the ordering key.
    pub fn date(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }
}

/// A movement ready to be appended (not yet assigned a sequence number).
///
/// The store assigns the sequence number during append and returns the stored
/// [`Movement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub outlet_id: OutletId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub related_movement_id: Option<MovementId>,
    pub note: Option<String>,
    pub actor: Option<String>,
}

impl NewMovement {
    /// Shape validation, applied before any movement reaches the store.
    ///
    /// - `In`/`Out`/transfer legs require a strictly positive quantity.
    /// - `Adjustment` requires a non-zero (signed) quantity.
    /// - Transfer legs must carry the pairing id.
    pub fn validate(&self) -> Result<(), StockError> {
        match self.kind {
            MovementKind::Adjustment => {
                if self.quantity == 0 {
                    return Err(StockError::validation("adjustment quantity cannot be zero"));
                }
            }
            MovementKind::In
            | MovementKind::Out
            | MovementKind::TransferOut
            | MovementKind::TransferIn => {
                if self.quantity <= 0 {
                    return Err(StockError::validation(format!(
                        "quantity must be positive, got {}",
                        self.quantity
                    )));
                }
            }
        }

        if self.kind.is_transfer() && self.related_movement_id.is_none() {
            return Err(StockError::validation(
                "transfer movement lacks its pairing id",
            ));
        }

        Ok(())
    }

    /// Promote to a stored movement with a store-assigned sequence.
    pub fn into_stored(self, sequence: u64) -> Movement {
        Movement {
            id: self.id,
            product_id: self.product_id,
            outlet_id: self.outlet_id,
            kind: self.kind,
            quantity: self.quantity,
            occurred_at: self.occurred_at,
            sequence,
            related_movement_id: self.related_movement_id,
            note: self.note,
            actor: self.actor,
        }
    }
}

/// Inclusive calendar-date range; `None` bounds are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self::between(date, date)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let date = at.date_naive();
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// Fold signed deltas over movements in ledger order.
///
/// Deterministic and reproducible given an identical ledger; this is the
/// single source of truth the cached balance projection must agree with.
pub fn fold_balance<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> i64 {
    movements.into_iter().map(|m| m.signed_delta()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_movement(kind: MovementKind, quantity: i64) -> Movement {
        Movement {
            id: MovementId::new(),
            product_id: ProductId::new(),
            outlet_id: OutletId::new(),
            kind,
            quantity,
            occurred_at: Utc::now(),
            sequence: 1,
            related_movement_id: None,
            note: None,
            actor: None,
        }
    }

    #[test]
    fn signed_delta_per_kind() {
        assert_eq!(test_movement(MovementKind::In, 5).signed_delta(), 5);
        assert_eq!(test_movement(MovementKind::Out, 5).signed_delta(), -5);
        assert_eq!(test_movement(MovementKind::Adjustment, -3).signed_delta(), -3);
        assert_eq!(test_movement(MovementKind::Adjustment, 3).signed_delta(), 3);
        assert_eq!(test_movement(MovementKind::TransferOut, 5).signed_delta(), -5);
        assert_eq!(test_movement(MovementKind::TransferIn, 5).signed_delta(), 5);
    }

    #[test]
    fn validation_rejects_non_positive_magnitudes() {
        let mut m = NewMovement {
            id: MovementId::new(),
            product_id: ProductId::new(),
            outlet_id: OutletId::new(),
            kind: MovementKind::In,
            quantity: 0,
            occurred_at: Utc::now(),
            related_movement_id: None,
            note: None,
            actor: None,
        };
        assert!(matches!(m.validate(), Err(StockError::Validation(_))));

        m.quantity = -4;
        assert!(matches!(m.validate(), Err(StockError::Validation(_))));

        m.quantity = 4;
        assert!(m.validate().is_ok());
    }

    #[test]
    fn adjustment_allows_negative_but_not_zero() {
        let mut m = NewMovement {
            id: MovementId::new(),
            product_id: ProductId::new(),
            outlet_id: OutletId::new(),
            kind: MovementKind::Adjustment,
            quantity: -10,
            occurred_at: Utc::now(),
            related_movement_id: None,
            note: None,
            actor: None,
        };
        assert!(m.validate().is_ok());

        m.quantity = 0;
        assert!(matches!(m.validate(), Err(StockError::Validation(_))));
    }

    #[test]
    fn transfer_leg_requires_pairing_id() {
        let mut m = NewMovement {
            id: MovementId::new(),
            product_id: ProductId::new(),
            outlet_id: OutletId::new(),
            kind: MovementKind::TransferOut,
            quantity: 5,
            occurred_at: Utc::now(),
            related_movement_id: None,
            note: None,
            actor: None,
        };
        assert!(matches!(m.validate(), Err(StockError::Validation(_))));

        m.related_movement_id = Some(MovementId::new());
        assert!(m.validate().is_ok());
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let range = DateRange::between(day(2), day(4));
        let at = |d: u32| {
            day(d)
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc()
        };

        assert!(!range.contains(at(1)));
        assert!(range.contains(at(2)));
        assert!(range.contains(at(4)));
        assert!(!range.contains(at(5)));
        assert!(DateRange::unbounded().contains(at(1)));
    }

    #[test]
    fn movement_json_uses_snake_case_kinds() {
        let movement = test_movement(MovementKind::TransferOut, 5);
        let json = serde_json::to_value(&movement).unwrap();

        assert_eq!(json["kind"], "transfer_out");
        assert_eq!(json["quantity"], 5);
        assert!(json["related_movement_id"].is_null());

        let back: Movement = serde_json::from_value(json).unwrap();
        assert_eq!(back, movement);
    }

    proptest! {
        /// Property: folding is exactly the sum of per-kind signed deltas,
        /// regardless of how the kinds interleave.
        #[test]
        fn fold_matches_manual_sum(
            entries in prop::collection::vec((0u8..5, 1i64..1_000), 0..50)
        ) {
            let movements: Vec<Movement> = entries
                .iter()
                .map(|(k, q)| {
                    let kind = match k {
                        0 => MovementKind::In,
                        1 => MovementKind::Out,
                        2 => MovementKind::Adjustment,
                        3 => MovementKind::TransferOut,
                        _ => MovementKind::TransferIn,
                    };
                    test_movement(kind, *q)
                })
                .collect();

            let expected: i64 = movements.iter().map(|m| m.kind.signed_delta(m.quantity)).sum();
            prop_assert_eq!(fold_balance(&movements), expected);
        }
    }
}
