//! String-encoded rational weights
//!
//! Weights arrive as `"numerator/denominator"` strings such as `"1/4"`.
//! Fractions are kept exactly as given: `"2/8"` is not reduced to `"1/4"`,
//! because the denominator feeds the cycle length calculation.

use crate::error::FractionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative rational weight with a positive denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fraction {
    numerator: u64,
    denominator: u64,
}

impl Fraction {
    /// Create a fraction, rejecting a zero denominator
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, FractionError> {
        if denominator == 0 {
            return Err(FractionError::ZeroDenominator);
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }
}

impl FromStr for Fraction {
    type Err = FractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FractionError::Malformed(s.to_string());

        let (num, den) = s.trim().split_once('/').ok_or_else(malformed)?;
        let numerator = num.trim().parse::<u64>().map_err(|_| malformed())?;

        // A negative denominator is reported the same way as zero
        let den = den.trim();
        let denominator = match den.parse::<u64>() {
            Ok(d) => d,
            Err(_) if den.parse::<i64>().map(|d| d <= 0).unwrap_or(false) => {
                return Err(FractionError::ZeroDenominator)
            }
            Err(_) => return Err(malformed()),
        };

        Self::new(numerator, denominator)
    }
}

impl TryFrom<String> for Fraction {
    type Error = FractionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Fraction> for String {
    fn from(f: Fraction) -> Self {
        f.to_string()
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
