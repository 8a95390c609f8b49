//! Recipe-constrained capacity planning.
//!
//! Pure, read-only computation over the ledger and the recipe catalog:
//! turns raw-material restock history into producible-unit counts per
//! finished item per day.

pub mod planner;

pub use planner::{CapacityEntry, CapacityPlanner};
