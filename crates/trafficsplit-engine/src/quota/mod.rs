//! Quota derivation
//!
//! Turns a ratio configuration into a cycle length and a per-target quota
//! table. Computed once per allocation plan.

pub mod lcm;
pub mod table;

pub use lcm::{compute_lcm, gcd, lcm};
pub use table::{build_quotas, QuotaEntry, QuotaTable};
