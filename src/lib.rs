// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Classical pseudo random number generators and the textbook hypothesis
//! tests used to judge them.

pub mod conditioning;
pub mod config;
pub mod distributions;
pub mod errors;
pub mod operations;
pub mod rng_testing;
pub mod rngs;
pub mod stats;
mod strings;
pub mod utils;
