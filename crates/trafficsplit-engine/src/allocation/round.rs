//! Per-round decision rules
//!
//! Pure functions applied to the post-increment counters returned by the
//! probe batch. Counter slices are always in quota table order.

use crate::quota::QuotaTable;
use crate::store::{CounterKey, CounterOp};

/// Cycle boundary heuristic: `total - N + 1 >= L`
///
/// `total` sums the post-increment counters of all N targets. This
/// approximates "L probes were issued since the last reset" and drifts when
/// rounds interleave; it is kept exactly for compatibility with counters
/// already written by other deployments.
pub fn should_reset(counts: &[i64], cycle_length: u64) -> bool {
    let total: i128 = counts.iter().map(|&c| i128::from(c)).sum();
    let n = counts.len() as i128;
    total - n + 1 >= i128::from(cycle_length)
}

/// Index of the first target, in quota order, whose counter is still within
/// its quota
pub fn select(quotas: &QuotaTable, counts: &[i64]) -> Option<usize> {
    quotas
        .iter()
        .zip(counts)
        .position(|(entry, &count)| i128::from(count) <= i128::from(entry.quota))
}

/// Second batch of a round
///
/// On a reset every counter, the winner's included, goes back to zero.
/// Otherwise each loser gives back its speculative probe and the winner
/// keeps it.
pub fn compensation(keys: &[CounterKey], selected: Option<usize>, reset: bool) -> Vec<CounterOp> {
    keys.iter()
        .enumerate()
        .filter_map(|(i, key)| {
            if reset {
                Some(CounterOp::Reset(key.clone()))
            } else if Some(i) == selected {
                None
            } else {
                Some(CounterOp::Decrement(key.clone()))
            }
        })
        .collect()
}
