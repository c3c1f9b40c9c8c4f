//! Allocation engine
//!
//! One call to [`Allocator::allocate`] is one round against the counter
//! store:
//!
//! 1. **Probe**: increment every target's counter in one atomic batch.
//! 2. **Cycle test**: `total - N + 1 >= L` decides whether counters reset.
//! 3. **Select**: first target, in quota order, still within its quota.
//! 4. **Compensate**: reset everything, or decrement every loser, in a
//!    second atomic batch.
//!
//! The two batches are not atomic with each other. Rounds from other
//! callers may interleave between them, so ratios converge statistically
//! rather than exactly per cycle under concurrency.

use super::round;
use crate::quota::QuotaTable;
use crate::store::{CounterKey, CounterOp, CounterStore};
use crate::telemetry::AllocatorMetrics;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use trafficsplit_common::{RatioConfig, Result, TrafficError, DEFAULT_STORE_TIMEOUT_MS};

/// Immutable (ratios, cycle length, quotas) tuple shared by every round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationPlan {
    ratios: RatioConfig,
    quotas: QuotaTable,
}

impl AllocationPlan {
    pub fn new(ratios: RatioConfig) -> Result<Self> {
        let quotas = QuotaTable::build(&ratios)?;
        Ok(Self { ratios, quotas })
    }

    pub fn ratios(&self) -> &RatioConfig {
        &self.ratios
    }

    pub fn quotas(&self) -> &QuotaTable {
        &self.quotas
    }

    pub fn cycle_length(&self) -> u64 {
        self.quotas.cycle_length()
    }

    /// Counter keys for `cycle_key`, in quota order
    pub fn counter_keys(&self, cycle_key: &str) -> Vec<CounterKey> {
        self.quotas
            .iter()
            .map(|e| CounterKey::for_target(cycle_key, &e.target))
            .collect()
    }
}

/// Outcome of one allocation round
#[derive(Debug)]
pub struct Decision {
    target: Option<String>,
    cycle_reset: bool,
    compensation_error: Option<TrafficError>,
}

impl Decision {
    /// Selected target, `None` if every counter was over quota
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn into_target(self) -> Option<String> {
        self.target
    }

    pub fn is_selected(&self) -> bool {
        self.target.is_some()
    }

    /// Whether this round reset the cycle's counters
    pub fn cycle_reset(&self) -> bool {
        self.cycle_reset
    }

    /// Set when the compensation batch failed. The decision still stands,
    /// but counters may need external reconciliation.
    pub fn compensation_error(&self) -> Option<&TrafficError> {
        self.compensation_error.as_ref()
    }
}

/// Stateless weighted allocator over a shared counter store
pub struct Allocator {
    plan: Arc<AllocationPlan>,
    store: Arc<dyn CounterStore>,
    deadline: Duration,
    metrics: Option<Arc<AllocatorMetrics>>,
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("plan", &self.plan)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Allocator {
    pub fn builder(store: Arc<dyn CounterStore>) -> AllocatorBuilder {
        AllocatorBuilder::new(store)
    }

    /// Allocator with the default store deadline and no metrics
    pub fn new(store: Arc<dyn CounterStore>, ratios: RatioConfig) -> Result<Self> {
        Self::builder(store).ratios(ratios).build()
    }

    pub fn plan(&self) -> &Arc<AllocationPlan> {
        &self.plan
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub(crate) fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    pub(crate) fn metrics(&self) -> Option<&Arc<AllocatorMetrics>> {
        self.metrics.as_ref()
    }

    /// Run one probe-and-compensate round for `cycle_key`
    ///
    /// Fails with `StoreUnavailable` or `StoreTimeout` if the probe batch
    /// fails; no decision is made then. A failed compensation batch does
    /// not fail the call and is reported on the returned [`Decision`].
    #[instrument(skip(self), fields(targets = self.plan.quotas.len()))]
    pub async fn allocate(&self, cycle_key: &str) -> Result<Decision> {
        let started = Instant::now();
        let quotas = self.plan.quotas();
        let keys = self.plan.counter_keys(cycle_key);

        let counts = match self.store.batch_increment(&keys, self.deadline).await {
            Ok(counts) => counts,
            Err(e) => {
                warn!(cycle_key, error = %e, "Probe batch failed, no decision made");
                if let Some(m) = &self.metrics {
                    m.record_store_error("probe", &e);
                }
                return Err(e);
            }
        };
        if counts.len() != keys.len() {
            return Err(TrafficError::StoreUnavailable(format!(
                "probe returned {} counters for {} targets",
                counts.len(),
                keys.len()
            )));
        }

        let reset = round::should_reset(&counts, quotas.cycle_length());
        let selected = round::select(quotas, &counts);
        let target = selected.map(|i| quotas.entries()[i].target.clone());
        debug!(?counts, ?target, reset, "Probe evaluated");

        let ops = round::compensation(&keys, selected, reset);
        let compensation_error = self.compensate(cycle_key, &ops).await;

        if let Some(m) = &self.metrics {
            let outcome = if target.is_some() { "selected" } else { "none" };
            m.decisions_total.with_label_values(&[outcome]).inc();
            if reset {
                m.cycle_resets_total.inc();
            }
            m.round_duration_seconds
                .observe(started.elapsed().as_secs_f64());
        }

        Ok(Decision {
            target,
            cycle_reset: reset,
            compensation_error,
        })
    }

    async fn compensate(&self, cycle_key: &str, ops: &[CounterOp]) -> Option<TrafficError> {
        if ops.is_empty() {
            return None;
        }

        match self.store.batch_apply(ops, self.deadline).await {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    cycle_key,
                    error = %e,
                    "Compensation batch failed, counters may be skewed"
                );
                if let Some(m) = &self.metrics {
                    m.record_store_error("compensation", &e);
                    m.compensation_failures_total.inc();
                }
                Some(TrafficError::CompensationFailed {
                    cycle_key: cycle_key.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Reset every target's counter for `cycle_key` to zero in one batch
    #[instrument(skip(self))]
    pub async fn reset_cycle(&self, cycle_key: &str) -> Result<()> {
        let ops: Vec<CounterOp> = self
            .plan
            .counter_keys(cycle_key)
            .into_iter()
            .map(CounterOp::Reset)
            .collect();

        self.store
            .batch_apply(&ops, self.deadline)
            .await
            .map_err(|e| {
                warn!(cycle_key, error = %e, "Cycle reset failed");
                if let Some(m) = &self.metrics {
                    m.record_store_error("reset", &e);
                }
                e
            })
    }
}

/// Builder for [`Allocator`]
pub struct AllocatorBuilder {
    store: Arc<dyn CounterStore>,
    ratios: Option<RatioConfig>,
    deadline: Duration,
    metrics: Option<Arc<AllocatorMetrics>>,
}

impl AllocatorBuilder {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            ratios: None,
            deadline: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            metrics: None,
        }
    }

    pub fn ratios(mut self, ratios: RatioConfig) -> Self {
        self.ratios = Some(ratios);
        self
    }

    /// Deadline applied to each of the two store batches
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn metrics(mut self, metrics: Arc<AllocatorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<Allocator> {
        let ratios = self
            .ratios
            .ok_or_else(|| TrafficError::Config("ratio configuration is required".into()))?;
        let plan = AllocationPlan::new(ratios)?;

        if !plan.quotas().is_exhaustive() {
            warn!(
                cycle_length = plan.cycle_length(),
                total_quota = %plan.quotas().total_quota(),
                "Configured fractions do not sum to one"
            );
        }
        info!(
            targets = plan.quotas().len(),
            cycle_length = plan.cycle_length(),
            deadline_ms = self.deadline.as_millis() as u64,
            "Allocator ready"
        );

        Ok(Allocator {
            plan: Arc::new(plan),
            store: self.store,
            deadline: self.deadline,
            metrics: self.metrics,
        })
    }
}
