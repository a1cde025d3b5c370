// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! User interaction strings are stored here.

pub const FAIL_STR: &str = "FAILED!!";
pub const PASS_STR: &str = "PASSED";

pub const TEST_NAMES: [&str; 6] = [
    "ChiSquare", "KS", "Z-Mean", "t-Mean", "U-Mean", "Variance",
];

pub const REJECT_EXPLANATION: &str =
    "The null hypothesis is rejected at the chosen significance level.";
pub const KEEP_EXPLANATION: &str =
    "There is not enough evidence to reject the null hypothesis.";
