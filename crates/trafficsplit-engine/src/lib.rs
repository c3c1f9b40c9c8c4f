//! # TrafficSplit
//!
//! Weighted allocation of events across targets, coordinated only through
//! a shared atomic counter store.
//!
//! ## Quota Formula
//!
//! ```text
//! L       = lcm(d1, ..., dn)
//! quota_i = n_i × (L / d_i)
//! ```
//!
//! Where:
//! - `n_i/d_i`: configured fraction for target i
//! - L: cycle length, the number of rounds after which the ratios repeat
//! - quota_i: wins allowed for target i within one cycle
//!
//! Every round increments all targets' counters, picks the highest-quota
//! target still within budget, then resets all counters (cycle boundary)
//! or decrements the losers.

pub mod allocation;
pub mod config;
pub mod quota;
pub mod store;
pub mod telemetry;

pub use allocation::{AllocationPlan, Allocator, AllocatorBuilder, Decision, SwappableAllocator};
pub use config::TrafficSplitConfig;
pub use quota::{QuotaEntry, QuotaTable};
pub use store::{CounterKey, CounterOp, CounterStore, InMemoryCounterStore, RedisCounterStore};
pub use trafficsplit_common::{ConfigError, Fraction, RatioConfig, Result, TrafficError};

use std::sync::Arc;

/// Build a Redis-backed allocator from configuration
pub async fn connect(config: &TrafficSplitConfig) -> Result<Allocator> {
    let ratios = config.ratio_config()?;

    let mut store = RedisCounterStore::connect(&config.redis_url).await?;
    if let Some(prefix) = &config.key_prefix {
        store = store.with_prefix(prefix);
    }

    Allocator::builder(Arc::new(store))
        .ratios(ratios)
        .deadline(config.store_timeout())
        .build()
}
