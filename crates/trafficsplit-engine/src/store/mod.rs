//! Atomic counter store
//!
//! The allocator keeps no state between calls. Every counter lives in a
//! shared store keyed by `(namespace, field)`, where the namespace is the
//! caller's cycle key and the field names the target. Safety comes entirely
//! from the store applying each batch all-or-nothing.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use trafficsplit_common::{counter_field, Result};

pub use self::memory::InMemoryCounterStore;
pub use self::redis::RedisCounterStore;

/// Address of one counter in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CounterKey {
    pub namespace: String,
    pub field: String,
}

impl CounterKey {
    pub fn new(namespace: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            field: field.into(),
        }
    }

    /// Counter for `target` within the cycle `cycle_key`
    pub fn for_target(cycle_key: &str, target: &str) -> Self {
        Self::new(cycle_key, counter_field(target))
    }
}

/// Corrective mutation applied after a round's winner is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CounterOp {
    /// Set the counter to zero
    Reset(CounterKey),
    /// Undo one speculative probe
    Decrement(CounterKey),
}

impl CounterOp {
    pub fn key(&self) -> &CounterKey {
        match self {
            CounterOp::Reset(key) | CounterOp::Decrement(key) => key,
        }
    }
}

/// Shared counter service consumed by the allocator
///
/// Both operations must be atomic across the whole batch and bounded by
/// `deadline`. On error or timeout no partial effect may be visible to
/// other callers; a timed-out batch may still land later on the server,
/// and callers treat that exactly like a failed one.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment every key by one and return the post-increment values in
    /// the same order as `keys`
    async fn batch_increment(&self, keys: &[CounterKey], deadline: Duration) -> Result<Vec<i64>>;

    /// Apply resets and decrements as one batch
    async fn batch_apply(&self, ops: &[CounterOp], deadline: Duration) -> Result<()>;
}
