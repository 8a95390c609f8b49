use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockroom_core::{MenuItemId, ProductId, StockError};

/// One ingredient line of a finished item's bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub menu_item_id: MenuItemId,
    pub ingredient_product_id: ProductId,
    /// Quantity of the ingredient consumed per produced unit, in the
    /// ingredient's smallest unit of measure. Strictly positive.
    pub quantity_required_per_unit: i64,
    /// Only default ingredients constrain capacity; optional extras do not.
    pub is_default: bool,
}

/// Maps finished items to their required ingredients.
///
/// Lookups preserve ingestion order, and `menu_items()` yields items in the
/// order they first appeared (catalog order), which drives tie-breaking when
/// capacity results are merged across the menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeCatalog {
    items: Vec<MenuItemId>,
    by_item: HashMap<MenuItemId, Vec<RecipeIngredient>>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one ingredient line.
    ///
    /// Rejects `quantity_required_per_unit <= 0` with
    /// [`StockError::RecipeConfiguration`]; a rejected line leaves the
    /// catalog untouched.
    pub fn ingest(&mut self, ingredient: RecipeIngredient) -> Result<(), StockError> {
        if ingredient.quantity_required_per_unit <= 0 {
            return Err(StockError::recipe_configuration(format!(
                "quantity_required_per_unit must be positive, got {} (menu item {})",
                ingredient.quantity_required_per_unit, ingredient.menu_item_id
            )));
        }

        if !self.by_item.contains_key(&ingredient.menu_item_id) {
            self.items.push(ingredient.menu_item_id);
        }
        self.by_item
            .entry(ingredient.menu_item_id)
            .or_default()
            .push(ingredient);
        Ok(())
    }

    /// Ingest a batch, failing fast on the first malformed line.
    pub fn ingest_all(
        &mut self,
        ingredients: impl IntoIterator<Item = RecipeIngredient>,
    ) -> Result<(), StockError> {
        for ingredient in ingredients {
            self.ingest(ingredient)?;
        }
        Ok(())
    }

    /// Ingredient lines for one item, in ingestion order. Empty for unknown
    /// items: missing recipe data degrades gracefully, it is not an error.
    pub fn ingredients(&self, menu_item_id: MenuItemId) -> &[RecipeIngredient] {
        self.by_item
            .get(&menu_item_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Default ingredient lines only (the capacity constraint set).
    pub fn default_ingredients(
        &self,
        menu_item_id: MenuItemId,
    ) -> impl Iterator<Item = &RecipeIngredient> {
        self.ingredients(menu_item_id)
            .iter()
            .filter(|i| i.is_default)
    }

    /// All known menu items, in catalog order.
    pub fn menu_items(&self) -> &[MenuItemId] {
        &self.items
    }
}
