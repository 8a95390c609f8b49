//! Stock ledger domain module.
//!
//! This crate contains the movement model and balance arithmetic, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod balance;
pub mod movement;
pub mod reader;

pub use balance::Balance;
pub use movement::{fold_balance, DateRange, Movement, MovementKind, NewMovement};
pub use reader::MovementReader;
