use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockroom_core::{MenuItemId, OutletId};
use stockroom_ledger::{DateRange, MovementKind, MovementReader};
use stockroom_recipes::{RecipeCatalog, RecipeIngredient};

/// Producible units of one finished item on one calendar date.
///
/// Derived, never persisted. `capacity` is always >= 1; dates that floor to
/// zero or below are dropped before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityEntry {
    pub menu_item_id: MenuItemId,
    pub date: NaiveDate,
    pub capacity: i64,
}

/// Computes per-date producible-unit counts from restock history.
///
/// Reads the ledger and catalog only; computations are pure and freely
/// parallelizable across menu items.
///
/// Date policy: a date is emitted when **at least one** default ingredient
/// has an adjustment bucketed on it, and the min is taken over only the
/// ingredients that reported that date. A missing ingredient-date acts as
/// "no constraint", not "zero capacity", so capacity can be overstated when
/// ingredients restock on different days.
#[derive(Debug)]
pub struct CapacityPlanner<L> {
    ledger: L,
    catalog: Arc<RecipeCatalog>,
}

impl<L> CapacityPlanner<L>
where
    L: MovementReader,
{
    pub fn new(ledger: L, catalog: Arc<RecipeCatalog>) -> Self {
        Self { ledger, catalog }
    }

    /// Capacity entries for one finished item at one outlet, ascending by
    /// date. Finite; restartable by re-issuing the call.
    ///
    /// An item with no configured (default) ingredients yields zero entries;
    /// sparse or missing data never raises.
    pub fn compute_capacity(
        &self,
        menu_item_id: MenuItemId,
        outlet_id: OutletId,
        range: &DateRange,
    ) -> impl Iterator<Item = CapacityEntry> {
        self.capacity_by_date(menu_item_id, outlet_id, range)
            .into_iter()
            .map(move |(date, capacity)| CapacityEntry {
                menu_item_id,
                date,
                capacity,
            })
    }

    /// Merged capacity entries across the whole catalog: ascending by date,
    /// catalog order among same-date ties.
    pub fn compute_capacity_for_all_menus(
        &self,
        outlet_id: OutletId,
        range: &DateRange,
    ) -> impl Iterator<Item = CapacityEntry> {
        let mut entries: Vec<CapacityEntry> = Vec::new();
        for &menu_item_id in self.catalog.menu_items() {
            entries.extend(self.compute_capacity(menu_item_id, outlet_id, range));
        }
        // Stable sort keeps catalog order among equal dates.
        entries.sort_by_key(|e| e.date);
        entries.into_iter()
    }

    /// Stage 2+3: per-date min-reduce over the ingredients reporting each
    /// date, then drop anything below one producible unit.
    fn capacity_by_date(
        &self,
        menu_item_id: MenuItemId,
        outlet_id: OutletId,
        range: &DateRange,
    ) -> BTreeMap<NaiveDate, i64> {
        let mut merged: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for ingredient in self.catalog.default_ingredients(menu_item_id) {
            for (date, units) in self.restock_units_by_date(ingredient, outlet_id, range) {
                merged
                    .entry(date)
                    .and_modify(|c| *c = (*c).min(units))
                    .or_insert(units);
            }
        }
        merged.retain(|_, capacity| *capacity >= 1);
        merged
    }

    /// Stage 1: bucket one ingredient's adjustment quantities by calendar
    /// date, then floor-divide by the per-unit requirement.
    fn restock_units_by_date(
        &self,
        ingredient: &RecipeIngredient,
        outlet_id: OutletId,
        range: &DateRange,
    ) -> BTreeMap<NaiveDate, i64> {
        let mut restocked: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for movement in
            self.ledger
                .movements(ingredient.ingredient_product_id, outlet_id, range)
        {
            if movement.kind == MovementKind::Adjustment {
                *restocked.entry(movement.date()).or_insert(0) += movement.quantity;
            }
        }

        restocked
            .into_iter()
            .map(|(date, quantity)| {
                (
                    date,
                    quantity.div_euclid(ingredient.quantity_required_per_unit),
                )
            })
            .collect()
    }
}
