// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Methods to turn generator output into more constrained data.

use crate::errors::StatError;

/// Maps a u64 to the 0..1 range in f64.
/// The destribution is uniform but only uses
/// the lower 52 bits of the u64.
/// Not all possible f64 in the output range are produced by this function.
pub fn u64_to_double(int: u64) -> f64 {
    let return_float = (int & 0x000fffffffffffff) | 0x3ff0000000000000;
    f64::from_bits(return_float) - 1.0
}

/// Count how many values of a [0, 1] sample fall into each of `intervals`
/// equal-width intervals.
/// A value of exactly 1.0 is counted in the last interval.
pub fn bin_unit_interval(sample: &[f64], intervals: usize) -> Result<Vec<u64>, StatError> {
    if intervals <= 1 {
        return Err(StatError::TooFewIntervals(intervals));
    }
    let mut counts = vec![0u64; intervals];
    for (index, &value) in sample.iter().enumerate() {
        if !value.is_finite() {
            return Err(StatError::NonFiniteValue { index });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(StatError::OutOfRange { index, value });
        }
        let bin = ((value * intervals as f64) as usize).min(intervals - 1);
        counts[bin] += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_to_double_range() {
        assert_eq!(u64_to_double(0), 0.0);
        let top = u64_to_double(u64::MAX);
        assert!(top < 1.0 && top > 0.999);
    }

    #[test]
    fn test_bin_unit_interval() {
        let sample = [0.0, 0.05, 0.1, 0.55, 0.99, 1.0];
        let counts = bin_unit_interval(&sample, 10).unwrap();
        assert_eq!(counts, vec![2, 1, 0, 0, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn test_bin_unit_interval_rejects() {
        assert_eq!(
            bin_unit_interval(&[0.5], 1),
            Err(StatError::TooFewIntervals(1))
        );
        assert_eq!(
            bin_unit_interval(&[0.5, 1.5], 4),
            Err(StatError::OutOfRange {
                index: 1,
                value: 1.5
            })
        );
        assert_eq!(
            bin_unit_interval(&[f64::NAN], 4),
            Err(StatError::NonFiniteValue { index: 0 })
        );
    }
}
