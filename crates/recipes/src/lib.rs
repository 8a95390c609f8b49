//! Recipe (bill-of-materials) reference data.
//!
//! Owned and mutated by external menu administration; the engine only reads
//! it. Ingestion is fail-fast: malformed entries are rejected at the boundary
//! rather than at compute time.

pub mod catalog;

pub use catalog::{RecipeCatalog, RecipeIngredient};
