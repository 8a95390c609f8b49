//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type StockResult<T> = Result<T, StockError>;

/// Domain-level error.
///
/// Keep this focused on deterministic shape failures raised by the domain
/// crates themselves. Stateful rejections (insufficient stock, missing
/// references, transfer integrity) carry request context and are modeled on
/// the command-handling layer instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A command carried malformed input (e.g. non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A recipe ingredient carried a non-positive per-unit quantity.
    #[error("recipe configuration invalid: {0}")]
    RecipeConfiguration(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl StockError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn recipe_configuration(msg: impl Into<String>) -> Self {
        Self::RecipeConfiguration(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
