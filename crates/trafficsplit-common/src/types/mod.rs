//! Core types for TrafficSplit

pub mod fraction;
pub mod ratio;
