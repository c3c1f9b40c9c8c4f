//! Tracing bootstrap and Prometheus metrics for the allocator

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trafficsplit_common::{Result, TrafficError};

/// Install a fmt subscriber filtered by `RUST_LOG`
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| TrafficError::Internal(format!("Failed to install tracing subscriber: {}", e)))
}

/// Prometheus metrics for allocation rounds
#[derive(Clone)]
pub struct AllocatorMetrics {
    /// Rounds that produced a decision, by outcome (`selected` / `none`)
    pub decisions_total: IntCounterVec,
    /// Rounds that reset the cycle's counters
    pub cycle_resets_total: IntCounter,
    /// Store failures, by phase (`probe` / `compensation` / `reset`) and
    /// kind (`unavailable` / `timeout`)
    pub store_errors_total: IntCounterVec,
    /// Compensation batches that failed after a decision was made
    pub compensation_failures_total: IntCounter,
    /// Duration of a full round, both batches included
    pub round_duration_seconds: Histogram,
}

impl AllocatorMetrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            decisions_total: IntCounterVec::new(
                Opts::new(
                    "trafficsplit_decisions_total",
                    "Allocation rounds completed, by outcome",
                ),
                &["outcome"],
            )
            .map_err(metrics_error)?,
            cycle_resets_total: IntCounter::new(
                "trafficsplit_cycle_resets_total",
                "Rounds that reset the cycle counters",
            )
            .map_err(metrics_error)?,
            store_errors_total: IntCounterVec::new(
                Opts::new(
                    "trafficsplit_store_errors_total",
                    "Counter store failures, by phase and kind",
                ),
                &["phase", "kind"],
            )
            .map_err(metrics_error)?,
            compensation_failures_total: IntCounter::new(
                "trafficsplit_compensation_failures_total",
                "Compensation batches that failed after a decision",
            )
            .map_err(metrics_error)?,
            round_duration_seconds: Histogram::with_opts(
                HistogramOpts::new(
                    "trafficsplit_round_duration_seconds",
                    "Allocation round duration",
                )
                .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            )
            .map_err(metrics_error)?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry
            .register(Box::new(self.decisions_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(self.cycle_resets_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(self.store_errors_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(self.compensation_failures_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(self.round_duration_seconds.clone()))
            .map_err(metrics_error)?;
        Ok(())
    }

    pub(crate) fn record_store_error(&self, phase: &str, err: &TrafficError) {
        let kind = match err {
            TrafficError::StoreTimeout { .. } => "timeout",
            _ => "unavailable",
        };
        self.store_errors_total.with_label_values(&[phase, kind]).inc();
    }
}

fn metrics_error(e: prometheus::Error) -> TrafficError {
    TrafficError::Internal(format!("Metrics error: {}", e))
}
