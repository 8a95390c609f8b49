use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{OutletId, ProductId};

use crate::movement::Movement;

/// Derived current balance for one (product, outlet) key.
///
/// A cache over the ledger, never an authority: it must always equal the fold
/// of all movements for its key up to `as_of_sequence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub product_id: ProductId,
    pub outlet_id: OutletId,
    pub value: i64,
    /// Sequence number of the last movement folded in (consistency watermark).
    pub as_of_sequence: u64,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    pub fn zero(product_id: ProductId, outlet_id: OutletId) -> Self {
        Self {
            product_id,
            outlet_id,
            value: 0,
            as_of_sequence: 0,
            updated_at: Utc::now(),
        }
    }

    /// Fold one movement into the balance.
    ///
    /// Movements at or below the watermark are ignored so application is
    /// idempotent under at-least-once delivery.
    pub fn apply(&mut self, movement: &Movement) {
        if movement.sequence <= self.as_of_sequence {
            return;
        }
        self.value += movement.signed_delta();
        self.as_of_sequence = movement.sequence;
        self.updated_at = Utc::now();
    }

    /// Full replay: fold an entire stream from zero.
    ///
    /// Folds every movement unconditionally. The stream arrives in
    /// (date, sequence) order, so a backdated entry can carry a higher
    /// sequence than a later-dated one; the watermark guard in [`apply`]
    /// would drop such movements and must not be used here. The resulting
    /// watermark is the maximum sequence seen.
    pub fn replay<'a>(
        product_id: ProductId,
        outlet_id: OutletId,
        movements: impl IntoIterator<Item = &'a Movement>,
    ) -> Self {
        let mut balance = Self::zero(product_id, outlet_id);
        for m in movements {
            balance.value += m.signed_delta();
            balance.as_of_sequence = balance.as_of_sequence.max(m.sequence);
        }
        balance.updated_at = Utc::now();
        balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovementKind;
    use stockroom_core::MovementId;

    fn movement(kind: MovementKind, quantity: i64, sequence: u64) -> Movement {
        Movement {
            id: MovementId::new(),
            product_id: ProductId::new(),
            outlet_id: OutletId::new(),
            kind,
            quantity,
            occurred_at: Utc::now(),
            sequence,
            related_movement_id: None,
            note: None,
            actor: None,
        }
    }

    #[test]
    fn replay_folds_in_order() {
        let product = ProductId::new();
        let outlet = OutletId::new();
        let stream = vec![
            movement(MovementKind::In, 10, 1),
            movement(MovementKind::Out, 4, 2),
            movement(MovementKind::Adjustment, -1, 3),
        ];

        let balance = Balance::replay(product, outlet, &stream);
        assert_eq!(balance.value, 5);
        assert_eq!(balance.as_of_sequence, 3);
    }

    #[test]
    fn replay_folds_backdated_movements() {
        let product = ProductId::new();
        let outlet = OutletId::new();
        // (date, sequence) order: the backdated second append (sequence 2)
        // sorts ahead of the first (sequence 1).
        let stream = vec![
            movement(MovementKind::In, 20, 2),
            movement(MovementKind::In, 10, 1),
        ];

        let balance = Balance::replay(product, outlet, &stream);
        assert_eq!(balance.value, 30);
        assert_eq!(balance.as_of_sequence, 2);
    }

    #[test]
    fn apply_is_idempotent_per_sequence() {
        let mut balance = Balance::zero(ProductId::new(), OutletId::new());
        let m = movement(MovementKind::In, 10, 1);

        balance.apply(&m);
        balance.apply(&m);

        assert_eq!(balance.value, 10);
        assert_eq!(balance.as_of_sequence, 1);
    }
}
