//! Dynamic reweighting
//!
//! Quotas are never mutated in place. A reweight builds a complete new
//! allocator (ratios, cycle length, quota table) and swaps it in under a
//! write lock. Rounds already running keep the `Arc` they started with and
//! finish against the old plan.
//!
//! Counters are not migrated. Callers that change weights usually also
//! switch to a fresh cycle key, or call [`SwappableAllocator::reset_cycle`].

use super::engine::{Allocator, Decision};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;
use trafficsplit_common::{RatioConfig, Result};

/// Allocator whose plan can be replaced while in use
pub struct SwappableAllocator {
    current: RwLock<Arc<Allocator>>,
}

impl SwappableAllocator {
    pub fn new(allocator: Allocator) -> Self {
        Self {
            current: RwLock::new(Arc::new(allocator)),
        }
    }

    /// Snapshot of the allocator new rounds will use
    pub fn current(&self) -> Arc<Allocator> {
        self.current.read().clone()
    }

    /// Run one round against the current plan
    pub async fn allocate(&self, cycle_key: &str) -> Result<Decision> {
        let allocator = self.current();
        allocator.allocate(cycle_key).await
    }

    pub async fn reset_cycle(&self, cycle_key: &str) -> Result<()> {
        let allocator = self.current();
        allocator.reset_cycle(cycle_key).await
    }

    /// Replace the ratios, keeping the store, deadline and metrics
    ///
    /// The new plan is fully validated before the swap; on error the
    /// current plan stays in place.
    pub fn reweight(&self, ratios: RatioConfig) -> Result<Arc<Allocator>> {
        let base = self.current();

        let mut builder = Allocator::builder(base.store().clone())
            .ratios(ratios)
            .deadline(base.deadline());
        if let Some(metrics) = base.metrics() {
            builder = builder.metrics(metrics.clone());
        }
        let next = Arc::new(builder.build()?);

        let previous = std::mem::replace(&mut *self.current.write(), next.clone());
        info!(
            previous_cycle_length = previous.plan().cycle_length(),
            cycle_length = next.plan().cycle_length(),
            "Allocation plan swapped"
        );
        Ok(previous)
    }

    /// Swap in a fully built allocator, returning the previous one
    pub fn replace(&self, allocator: Allocator) -> Arc<Allocator> {
        std::mem::replace(&mut *self.current.write(), Arc::new(allocator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCounterStore;
    use trafficsplit_common::{ConfigError, TrafficError};

    fn allocator(store: Arc<InMemoryCounterStore>) -> SwappableAllocator {
        let ratios = RatioConfig::parse([("A", "1/2"), ("B", "1/2")]).unwrap();
        SwappableAllocator::new(Allocator::new(store, ratios).unwrap())
    }

    #[tokio::test]
    async fn test_reweight_swaps_whole_plan() {
        let store = Arc::new(InMemoryCounterStore::new());
        let swappable = allocator(store);

        let old = swappable.current();
        let returned = swappable
            .reweight(RatioConfig::parse([("A", "1/3"), ("B", "2/3")]).unwrap())
            .unwrap();

        assert!(Arc::ptr_eq(&old, &returned));
        assert_eq!(old.plan().cycle_length(), 2);
        assert_eq!(swappable.current().plan().cycle_length(), 3);
        assert_eq!(swappable.current().plan().quotas().quota_of("B"), Some(2));

        // The snapshot taken before the swap still uses the old quotas
        assert_eq!(old.plan().quotas().quota_of("B"), Some(1));
    }

    #[tokio::test]
    async fn test_invalid_reweight_keeps_current_plan() {
        let store = Arc::new(InMemoryCounterStore::new());
        let swappable = allocator(store);

        // Valid fractions whose cycle length overflows
        let ratios = RatioConfig::parse([
            ("A", "1/9223372036854775807"),
            ("B", "1/9223372036854775806"),
        ])
        .unwrap();

        let err = swappable.reweight(ratios).unwrap_err();
        assert!(matches!(
            err,
            TrafficError::InvalidConfig(ConfigError::CycleOverflow)
        ));
        assert_eq!(swappable.current().plan().cycle_length(), 2);
    }

    #[tokio::test]
    async fn test_allocate_after_reweight_uses_new_targets() {
        let store = Arc::new(InMemoryCounterStore::new());
        let swappable = allocator(store);

        swappable
            .reweight(RatioConfig::parse([("C", "1/1")]).unwrap())
            .unwrap();
        let decision = swappable.allocate("cycle").await.unwrap();
        assert_eq!(decision.target(), Some("C"));

        swappable.reset_cycle("cycle").await.unwrap();
    }
}
