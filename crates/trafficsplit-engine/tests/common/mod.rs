//! Shared test doubles for allocator integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use trafficsplit_engine::{
    CounterKey, CounterOp, CounterStore, InMemoryCounterStore, RatioConfig, Result, TrafficError,
};

/// How the next batch of a given kind should misbehave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Behave normally
    None,
    /// Fail without touching any counter
    Unavailable,
    /// Apply the batch, then report a timeout anyway
    TimeoutAfterApply,
}

/// Wraps an in-memory store and injects faults per batch kind
pub struct FaultyStore {
    inner: Arc<InMemoryCounterStore>,
    probe_fault: Mutex<Fault>,
    apply_fault: Mutex<Fault>,
    probe_calls: Mutex<usize>,
    apply_calls: Mutex<usize>,
}

impl FaultyStore {
    pub fn new(inner: Arc<InMemoryCounterStore>) -> Self {
        Self {
            inner,
            probe_fault: Mutex::new(Fault::None),
            apply_fault: Mutex::new(Fault::None),
            probe_calls: Mutex::new(0),
            apply_calls: Mutex::new(0),
        }
    }

    pub fn fail_probe(&self, fault: Fault) {
        *self.probe_fault.lock() = fault;
    }

    pub fn fail_apply(&self, fault: Fault) {
        *self.apply_fault.lock() = fault;
    }

    pub fn probe_calls(&self) -> usize {
        *self.probe_calls.lock()
    }

    pub fn apply_calls(&self) -> usize {
        *self.apply_calls.lock()
    }
}

fn timeout(operation: &'static str, deadline: Duration) -> TrafficError {
    TrafficError::StoreTimeout {
        operation,
        limit_ms: deadline.as_millis() as u64,
    }
}

#[async_trait]
impl CounterStore for FaultyStore {
    async fn batch_increment(&self, keys: &[CounterKey], deadline: Duration) -> Result<Vec<i64>> {
        *self.probe_calls.lock() += 1;
        let fault = *self.probe_fault.lock();
        match fault {
            Fault::None => self.inner.batch_increment(keys, deadline).await,
            Fault::Unavailable => Err(TrafficError::StoreUnavailable("injected".into())),
            Fault::TimeoutAfterApply => {
                self.inner.batch_increment(keys, deadline).await?;
                Err(timeout("probe", deadline))
            }
        }
    }

    async fn batch_apply(&self, ops: &[CounterOp], deadline: Duration) -> Result<()> {
        *self.apply_calls.lock() += 1;
        let fault = *self.apply_fault.lock();
        match fault {
            Fault::None => self.inner.batch_apply(ops, deadline).await,
            Fault::Unavailable => Err(TrafficError::StoreUnavailable("injected".into())),
            Fault::TimeoutAfterApply => {
                self.inner.batch_apply(ops, deadline).await?;
                Err(timeout("compensation", deadline))
            }
        }
    }
}

pub fn half_quarter_quarter() -> RatioConfig {
    RatioConfig::parse([("A", "1/2"), ("B", "1/4"), ("C", "1/4")]).unwrap()
}
