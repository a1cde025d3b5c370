// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Input validation errors shared by generators and tests.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatError {
    #[error("[Generator] Invalid seed {seed}: {reason}")]
    InvalidSeed { seed: u64, reason: String },
    #[error("[Generator] Modulus must be positive, got {0}")]
    InvalidModulus(i64),
    #[error("[Test] At least two intervals are required, got {0}")]
    TooFewIntervals(usize),
    #[error("[Test] Expected {expected} frequencies, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
    #[error("[Test] Frequency of interval {index} is negative ({value})")]
    NegativeFrequency { index: usize, value: i64 },
    #[error("[Test] Sum of frequencies exceeds {}", u64::MAX)]
    FrequencyOverflow,
    #[error("[Test] Sample too small: need at least {needed} values, got {actual}")]
    EmptySample { needed: usize, actual: usize },
    #[error("[Test] Standard error is degenerate ({0})")]
    DegenerateVariance(f64),
    #[error("[Test] Hypothesized variance must be positive, got {0}")]
    DegenerateHypothesis(f64),
    #[error("[Test] Significance level must lie in (0, 1), got {0}")]
    InvalidSignificance(f64),
    #[error("[Test] Value at position {index} is not finite")]
    NonFiniteValue { index: usize },
    #[error("[Test] Parameter {name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
    #[error("[Test] Value {value} at position {index} lies outside [0, 1]")]
    OutOfRange { index: usize, value: f64 },
    #[error("[Distribution] {0}")]
    Distribution(String),
}
