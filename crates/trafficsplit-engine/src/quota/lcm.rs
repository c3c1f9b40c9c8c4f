//! Cycle length calculation
//!
//! The cycle length L is the least common multiple of every configured
//! denominator, folded pairwise as `lcm(a, b) = a / gcd(a, b) * b`.

use trafficsplit_common::ConfigError;

/// Greatest common divisor (Euclid)
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Least common multiple of two positive integers
pub fn lcm(a: u64, b: u64) -> Result<u64, ConfigError> {
    if a == 0 || b == 0 {
        return Err(ConfigError::ZeroDenominator);
    }
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(ConfigError::CycleOverflow)
}

/// Least common multiple of a set of denominators
///
/// Returns 1 for an empty set. A zero denominator is an error rather than
/// a hang.
pub fn compute_lcm(denominators: &[u64]) -> Result<u64, ConfigError> {
    denominators.iter().try_fold(1u64, |acc, &d| lcm(acc, d))
}
