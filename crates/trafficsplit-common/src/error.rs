//! Error types for TrafficSplit
//!
//! Provides a unified error type and the configuration error variants
//! raised while validating ratio maps.

use thiserror::Error;

/// Result type alias using TrafficError
pub type Result<T> = std::result::Result<T, TrafficError>;

/// Unified error type for TrafficSplit operations
#[derive(Debug, Error)]
pub enum TrafficError {
    // Ratio map validation, fatal at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    // Transport-level failure reaching the counter store
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    // Deadline elapsed, outcome of the batch unknown
    #[error("Counter store {operation} timed out after {limit_ms}ms")]
    StoreTimeout {
        operation: &'static str,
        limit_ms: u64,
    },

    // Second batch failed after the winner was decided
    #[error("Compensation failed for cycle {cycle_key}: {reason}")]
    CompensationFailed { cycle_key: String, reason: String },

    // Settings loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrafficError {
    /// True for `StoreUnavailable` and `StoreTimeout`.
    ///
    /// Both abort a round before any decision is made, and callers should
    /// assume no mutation happened even though a timed-out batch may have
    /// landed on the server.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            TrafficError::StoreUnavailable(_) | TrafficError::StoreTimeout { .. }
        )
    }
}

/// Ratio map validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("ratio map must contain at least one target")]
    EmptyRatioMap,

    #[error("target id must not be empty")]
    EmptyTargetId,

    #[error("duplicate target id: {0}")]
    DuplicateTarget(String),

    #[error("invalid fraction for target {target}: {source}")]
    InvalidFraction {
        target: String,
        #[source]
        source: FractionError,
    },

    #[error("denominator must be positive")]
    ZeroDenominator,

    #[error("cycle length overflows u64")]
    CycleOverflow,

    #[error("quota for target {0} overflows u64")]
    QuotaOverflow(String),

    #[error("cycle length {cycle_length} is not divisible by denominator {denominator}")]
    IndivisibleCycle { cycle_length: u64, denominator: u64 },
}

/// Fraction parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FractionError {
    #[error("expected \"numerator/denominator\", got {0:?}")]
    Malformed(String),

    #[error("denominator must be positive")]
    ZeroDenominator,
}
