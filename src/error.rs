//! Error types for cache construction
//!
//! Provides unified configuration error handling using thiserror.

use thiserror::Error;

// == Config Error Enum ==
/// Errors raised while building a cache or loading its configuration.
///
/// Operations on a constructed cache are total and never return errors;
/// the only failure surface is construction time. Absent keys and
/// compare-and-swap mismatches are ordinary results, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration value could not be parsed or is out of range
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Name of the offending setting
        name: &'static str,
        /// The rejected raw input
        value: String,
    },

    /// The pre-sizing hint contradicts the hard capacity bound
    #[error("Initial capacity {initial_capacity} exceeds capacity bound {capacity}")]
    InitialCapacityExceedsBound {
        initial_capacity: usize,
        capacity: usize,
    },
}
