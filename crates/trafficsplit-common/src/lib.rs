//! # TrafficSplit Common
//!
//! Shared types and errors for the TrafficSplit weighted allocator.
//!
//! ## Core Types
//!
//! - [`Fraction`]: string-encoded rational weight (`"1/4"`)
//! - [`RatioConfig`]: validated, ordered target → fraction mapping
//! - [`TrafficError`]: unified error type

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, FractionError, Result, TrafficError};
pub use types::{
    fraction::Fraction,
    ratio::{RatioConfig, TargetWeight},
};

/// TrafficSplit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default deadline for one counter store batch, in milliseconds
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 1000;

/// Default counter store URL
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Counter field name for a target inside a cycle's hash
///
/// Matches the layout already present in deployed stores.
pub fn counter_field(target: &str) -> String {
    format!("obj:{}:t", target)
}
