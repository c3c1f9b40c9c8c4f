//! Quota table
//!
//! Scales every fraction to the common cycle length L. A target with weight
//! `n/d` may win at most `n * (L / d)` rounds per cycle. Entries are ordered
//! by descending quota, ties broken by ascending target id, so that
//! selection is reproducible across processes.

use super::lcm::compute_lcm;
use serde::Serialize;
use std::cmp::Reverse;
use trafficsplit_common::{ConfigError, RatioConfig};

/// Maximum number of wins for one target within a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaEntry {
    pub target: String,
    pub quota: u64,
}

/// Ordered quotas for one ratio configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaTable {
    cycle_length: u64,
    entries: Vec<QuotaEntry>,
}

impl QuotaTable {
    /// Derive the cycle length and quotas for a ratio configuration
    pub fn build(ratios: &RatioConfig) -> Result<Self, ConfigError> {
        let cycle_length = compute_lcm(&ratios.denominators())?;
        let entries = build_quotas(ratios, cycle_length)?;
        Ok(Self {
            cycle_length,
            entries,
        })
    }

    /// Cycle length L
    pub fn cycle_length(&self) -> u64 {
        self.cycle_length
    }

    pub fn entries(&self) -> &[QuotaEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuotaEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn quota_of(&self, target: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.target == target)
            .map(|e| e.quota)
    }

    /// Sum of all quotas, widened so it cannot overflow
    pub fn total_quota(&self) -> u128 {
        self.entries.iter().map(|e| u128::from(e.quota)).sum()
    }

    /// True when the quotas fill the cycle exactly, i.e. the configured
    /// fractions sum to one
    pub fn is_exhaustive(&self) -> bool {
        self.total_quota() == u128::from(self.cycle_length)
    }
}

/// Scale each fraction to `cycle_length` and order the result
///
/// `cycle_length` must be divisible by every denominator.
pub fn build_quotas(
    ratios: &RatioConfig,
    cycle_length: u64,
) -> Result<Vec<QuotaEntry>, ConfigError> {
    let mut entries = ratios
        .iter()
        .map(|tw| {
            let denominator = tw.weight.denominator();
            if denominator == 0 {
                return Err(ConfigError::ZeroDenominator);
            }
            if cycle_length % denominator != 0 {
                return Err(ConfigError::IndivisibleCycle {
                    cycle_length,
                    denominator,
                });
            }
            let quota = tw
                .weight
                .numerator()
                .checked_mul(cycle_length / denominator)
                .ok_or_else(|| ConfigError::QuotaOverflow(tw.target.clone()))?;
            Ok(QuotaEntry {
                target: tw.target.clone(),
                quota,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    entries.sort_by(|a, b| {
        (Reverse(a.quota), &a.target).cmp(&(Reverse(b.quota), &b.target))
    });

    Ok(entries)
}
