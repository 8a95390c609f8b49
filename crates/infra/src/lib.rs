//! Infrastructure layer: ledger storage, balance read models, command handling.

pub mod directory;
pub mod ledger_store;
pub mod movement_handler;
pub mod projections;
pub mod read_model;
