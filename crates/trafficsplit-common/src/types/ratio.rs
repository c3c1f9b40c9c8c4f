//! Ratio configuration
//!
//! Ordered mapping from target id to the fraction of traffic it should
//! receive. Validated once and immutable afterwards.

use crate::error::ConfigError;
use crate::types::fraction::Fraction;
use serde::Serialize;
use std::collections::HashSet;

/// A target and its configured weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetWeight {
    pub target: String,
    pub weight: Fraction,
}

/// Validated, immutable target → fraction mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatioConfig {
    entries: Vec<TargetWeight>,
}

impl RatioConfig {
    /// Build from already-parsed fractions, preserving input order
    pub fn new<I, K>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, Fraction)>,
        K: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for (target, weight) in entries {
            let target = target.into();
            if target.is_empty() {
                return Err(ConfigError::EmptyTargetId);
            }
            if !seen.insert(target.clone()) {
                return Err(ConfigError::DuplicateTarget(target));
            }
            if weight.denominator() == 0 {
                return Err(ConfigError::ZeroDenominator);
            }
            out.push(TargetWeight { target, weight });
        }

        if out.is_empty() {
            return Err(ConfigError::EmptyRatioMap);
        }

        Ok(Self { entries: out })
    }

    /// Build from string-encoded fractions, e.g. `[("a", "1/2"), ("b", "1/2")]`
    pub fn parse<I, K, V>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let parsed = entries
            .into_iter()
            .map(|(target, raw)| {
                let target = target.into();
                raw.as_ref()
                    .parse::<Fraction>()
                    .map(|weight| (target.clone(), weight))
                    .map_err(|source| ConfigError::InvalidFraction { target, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(parsed)
    }

    /// Entries in configuration order
    pub fn entries(&self) -> &[TargetWeight] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetWeight> {
        self.entries.iter()
    }

    /// Number of configured targets (never zero)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn denominators(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.weight.denominator()).collect()
    }

    pub fn weight_of(&self, target: &str) -> Option<Fraction> {
        self.entries
            .iter()
            .find(|e| e.target == target)
            .map(|e| e.weight)
    }
}
