//! In-process counter store
//!
//! A single mutex guards the whole keyspace so every batch is applied
//! atomically. Only callers inside one process share its counters.

use super::{CounterKey, CounterOp, CounterStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use trafficsplit_common::Result;

/// In-memory implementation of [`CounterStore`]
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<CounterKey, i64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, zero if it was never touched
    pub fn get(&self, key: &CounterKey) -> i64 {
        self.counters.lock().get(key).copied().unwrap_or(0)
    }

    /// Overwrite a counter
    pub fn seed(&self, key: CounterKey, value: i64) {
        self.counters.lock().insert(key, value);
    }

    /// All counters of one namespace, by field
    pub fn snapshot(&self, namespace: &str) -> BTreeMap<String, i64> {
        self.counters
            .lock()
            .iter()
            .filter(|(k, _)| k.namespace == namespace)
            .map(|(k, v)| (k.field.clone(), *v))
            .collect()
    }

    pub fn clear(&self) {
        self.counters.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn batch_increment(&self, keys: &[CounterKey], _deadline: Duration) -> Result<Vec<i64>> {
        let mut counters = self.counters.lock();
        let values = keys
            .iter()
            .map(|key| {
                let value = counters.entry(key.clone()).or_insert(0);
                *value += 1;
                *value
            })
            .collect();
        Ok(values)
    }

    async fn batch_apply(&self, ops: &[CounterOp], _deadline: Duration) -> Result<()> {
        let mut counters = self.counters.lock();
        for op in ops {
            match op {
                CounterOp::Reset(key) => {
                    counters.insert(key.clone(), 0);
                }
                CounterOp::Decrement(key) => {
                    *counters.entry(key.clone()).or_insert(0) -= 1;
                }
            }
        }
        Ok(())
    }
}
