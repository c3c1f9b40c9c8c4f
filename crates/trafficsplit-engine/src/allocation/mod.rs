//! Weighted allocation
//!
//! Provides the probe-and-compensate allocation engine with:
//! - Pure per-round rules (cycle test, greedy selection, compensation)
//! - An immutable allocation plan per engine
//! - Whole-plan swapping for dynamic reweighting

pub mod engine;
pub mod round;
pub mod swap;

pub use engine::{AllocationPlan, Allocator, AllocatorBuilder, Decision};
pub use swap::SwappableAllocator;
