//! Time and price calculation over an immutable configuration snapshot.
//!
//! ```text
//! pricing/
//! ├── config.rs           ConfigSnapshot (TOML), validation, lookups, sources
//! ├── time_estimator.rs   machine minutes from job geometry
//! └── calculator.rs       hybrid / value models, material cost, approval status
//! ```

pub mod calculator;
pub mod config;
pub mod time_estimator;

pub use calculator::PricingCalculator;
pub use config::{ConfigSnapshot, SnapshotSource, TomlFileSource};
pub use time_estimator::{TimeEstimate, TimeEstimator};

/// Internal error type for pricing failures.
/// The boundary maps these onto `AppError` variants.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    /// The snapshot could not be loaded; the caller may retry.
    #[error("configuration unavailable: {0}")]
    ConfigUnavailable(String),
    /// The snapshot loaded but failed validation.
    #[error("config error: {0}")]
    Config(String),
    /// The selected technology cannot process the selected material.
    #[error("incompatible selection: {0}")]
    Incompatible(String),
}
