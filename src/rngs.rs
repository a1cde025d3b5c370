// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Implementation of the classical generators.
//! All implement the Generator interface, some feature additional methods like:
//! cycle_length(limit: u64) or steps(count: usize)

use rand::{RngCore, SeedableRng};

use crate::conditioning;

/// General trait for generators producing values in the unit interval.
pub trait Generator {
    /// Generate a value in [0, 1] and advance the state one step.
    fn next_f64(&mut self) -> f64;
    /// Reset to the inital state, equivalent to constructing anew.
    fn reset(&mut self);
    /// Generate 'count' values.
    fn sample(&mut self, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.next_f64()).collect()
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Wrapper around the rand crates default RNG, used as a baseline
/// when comparing the classical generators.
pub struct ReferenceRand {
    seed: u64,
    rng: rand::rngs::StdRng,
}

impl ReferenceRand {
    pub fn new(seed: u64) -> Self {
        ReferenceRand {
            seed,
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl Generator for ReferenceRand {
    fn next_f64(&mut self) -> f64 {
        conditioning::u64_to_double(self.rng.next_u64())
    }

    fn reset(&mut self) {
        self.rng = rand::rngs::StdRng::seed_from_u64(self.seed);
    }
}

/// Von Neumann's middle-square method on decimal digits.
pub mod middle_square {
    use super::Generator;
    use crate::errors::StatError;
    use serde::{Deserialize, Serialize};
    use tracing::{trace, warn};

    /// Squares of 18 digit states still fit in a u128.
    pub const MAX_DIGITS: u32 = 18;

    /// Divisor used to map the d digit state into the unit interval.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Normalization {
        /// x / 10^d, output in [0, 1).
        #[default]
        PowerOfTen,
        /// x / (10^d - 1), output in [0, 1].
        MaxValue,
    }

    impl Normalization {
        pub fn divisor(&self, digits: u32) -> f64 {
            let base = 10u128.pow(digits) as f64;
            match self {
                Normalization::PowerOfTen => base,
                Normalization::MaxValue => base - 1.0,
            }
        }
    }

    /// One iteration, the square is zero padded to twice the state width.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Step {
        pub digits: u32,
        pub state: u128,
        pub square: u128,
        pub next: u128,
        pub value: f64,
    }

    impl Step {
        pub fn format(&self) -> String {
            let d = self.digits as usize;
            format!(
                "X = {:0d$}     X^2 = {:0w$}     middle = {:0d$}",
                self.state,
                self.square,
                self.next,
                d = d,
                w = 2 * d
            )
        }
    }

    /// Number of decimal digits of 'value', 0 has one digit.
    pub fn digit_count(value: u64) -> u32 {
        value.checked_ilog10().map_or(1, |log| log + 1)
    }

    #[derive(Debug, Copy, Clone)]
    pub struct MiddleSquare {
        seed: u128,
        state: u128,
        digits: u32,
        normalization: Normalization,
    }

    impl MiddleSquare {
        /// Uses the digit count of the seed as state width.
        pub fn new(seed: u64, normalization: Normalization) -> Result<Self, StatError> {
            Self::with_digits(seed, digit_count(seed), normalization)
        }

        /// Uses a fixed state width, the seed is zero padded to 'digits'.
        pub fn with_digits(
            seed: u64,
            digits: u32,
            normalization: Normalization,
        ) -> Result<Self, StatError> {
            let reason = if digits == 0 || digits % 2 != 0 {
                Some(format!("digit count {digits} is not even"))
            } else if digits > MAX_DIGITS {
                Some(format!("digit count {digits} exceeds {MAX_DIGITS}"))
            } else if digit_count(seed) > digits {
                Some(format!("seed does not fit into {digits} digits"))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(StatError::InvalidSeed { seed, reason });
            }
            Ok(MiddleSquare {
                seed: seed as u128,
                state: seed as u128,
                digits,
                normalization,
            })
        }

        /// Square the state, keep the middle 'digits' digits of the
        /// 2 * 'digits' wide zero padded square.
        pub fn step(&mut self) -> Step {
            let square = self.state * self.state;
            let next = (square / 10u128.pow(self.digits / 2)) % 10u128.pow(self.digits);
            trace!(state = %self.state, square = %square, next = %next, "middle-square step");
            if next == 0 && self.state != 0 {
                warn!(seed = %self.seed, "middle-square generator collapsed to zero");
            }
            let step = Step {
                digits: self.digits,
                state: self.state,
                square,
                next,
                value: next as f64 / self.normalization.divisor(self.digits),
            };
            self.state = next;
            step
        }

        pub fn next_raw(&mut self) -> u128 {
            self.step().next
        }

        /// Run 'count' iterations and keep every intermediate value.
        pub fn steps(&mut self, count: usize) -> Vec<Step> {
            (0..count).map(|_| self.step()).collect()
        }
    }

    impl Generator for MiddleSquare {
        fn next_f64(&mut self) -> f64 {
            self.step().value
        }

        fn reset(&mut self) {
            self.state = self.seed;
        }
    }

    /// Generate 'count' values from 'seed', the state width is the seed's digit count.
    pub fn generate(
        seed: u64,
        count: usize,
        normalization: Normalization,
    ) -> Result<Vec<f64>, StatError> {
        Ok(MiddleSquare::new(seed, normalization)?.sample(count))
    }
}

/// Linear congruential generators
pub mod lcg {
    use super::Generator;
    use crate::errors::StatError;
    use serde::{Deserialize, Serialize};
    use tracing::trace;

    /// One iteration X(i+1) = a * X(i) mod m.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Step {
        pub state: i64,
        pub multiplier: i64,
        pub modulus: i64,
        pub product: i128,
        pub next: i64,
        pub value: f64,
    }

    impl Step {
        pub fn format(&self) -> String {
            format!(
                "X = ({} * {}) mod {} = {} mod {} = {}",
                self.multiplier, self.state, self.modulus, self.product, self.modulus, self.next
            )
        }
    }

    /// Multiplicative congruential generator X(i+1) = a * X(i) mod m.
    /// No constraints are placed on seed and multiplier, poorly chosen
    /// parameters produce short cycles.
    #[derive(Debug, Copy, Clone)]
    pub struct Lcg {
        seed: i64,
        state: i64,
        multiplier: i64,
        modulus: i64,
    }

    impl Lcg {
        pub fn new(seed: i64, multiplier: i64, modulus: i64) -> Result<Self, StatError> {
            if modulus <= 0 {
                return Err(StatError::InvalidModulus(modulus));
            }
            Ok(Lcg {
                seed,
                state: seed,
                multiplier,
                modulus,
            })
        }

        fn apply(&self, x: i64) -> i64 {
            // rem_euclid keeps residues in 0..m for negative operands.
            (self.multiplier as i128 * x as i128).rem_euclid(self.modulus as i128) as i64
        }

        /// Advance the state, recording the product and the new residue.
        pub fn step(&mut self) -> Step {
            let product = self.multiplier as i128 * self.state as i128;
            let next = self.apply(self.state);
            trace!(state = self.state, next, "lcg step");
            let step = Step {
                state: self.state,
                multiplier: self.multiplier,
                modulus: self.modulus,
                product,
                next,
                value: next as f64 / self.modulus as f64,
            };
            self.state = next;
            step
        }

        /// Advance the state and return the new residue in 0..m.
        pub fn next_raw(&mut self) -> i64 {
            self.step().next
        }

        /// Run 'count' iterations and keep every intermediate value.
        pub fn steps(&mut self, count: usize) -> Vec<Step> {
            (0..count).map(|_| self.step()).collect()
        }

        /// Length of the cycle the residue sequence eventually enters,
        /// found with Brent's algorithm.
        /// Returns None if no cycle is found within 'limit' steps.
        pub fn cycle_length(&self, limit: u64) -> Option<u64> {
            let start = self.apply(self.seed);
            let mut power: u64 = 1;
            let mut length: u64 = 1;
            let mut tortoise = start;
            let mut hare = self.apply(start);
            let mut steps: u64 = 1;
            while tortoise != hare {
                if steps >= limit {
                    return None;
                }
                if power == length {
                    tortoise = hare;
                    power *= 2;
                    length = 0;
                }
                hare = self.apply(hare);
                length += 1;
                steps += 1;
            }
            Some(length)
        }
    }

    impl Generator for Lcg {
        fn next_f64(&mut self) -> f64 {
            self.step().value
        }

        fn reset(&mut self) {
            self.state = self.seed;
        }
    }

    /// Generate 'count' values U(i) = X(i+1) / m.
    pub fn generate(
        seed: i64,
        multiplier: i64,
        modulus: i64,
        count: usize,
    ) -> Result<Vec<f64>, StatError> {
        Ok(Lcg::new(seed, multiplier, modulus)?.sample(count))
    }
}

#[cfg(test)]
mod tests {
    use super::middle_square::{self, MiddleSquare, Normalization};
    use super::*;
    use crate::errors::StatError;

    #[test]
    fn test_middle_square_known_sequence() {
        // 5735^2 = 32890225 -> 8902, 8902^2 = 79245604 -> 2456
        let values = middle_square::generate(5735, 2, Normalization::PowerOfTen).unwrap();
        assert_eq!(values, vec![0.8902, 0.2456]);
    }

    #[test]
    fn test_middle_square_zero_padding() {
        // 1234^2 = 01522756 -> 5227
        let mut g = MiddleSquare::new(1234, Normalization::PowerOfTen).unwrap();
        assert_eq!(g.next_raw(), 5227);
        // 42 as four digits: 0042^2 = 00001764 -> 0017
        let mut g = MiddleSquare::with_digits(42, 4, Normalization::PowerOfTen).unwrap();
        assert_eq!(g.next_raw(), 17);
    }

    #[test]
    fn test_middle_square_widest_state() {
        let seed = 999_999_999_999_999_999;
        let mut g = MiddleSquare::new(seed, Normalization::PowerOfTen).unwrap();
        assert_eq!(g.next_raw(), 999_999_998_000_000_000);

        let mut g = MiddleSquare::new(123_456_789_012_345_678, Normalization::PowerOfTen).unwrap();
        let step = g.step();
        assert_eq!(step.next, 753_238_836_527_968_299);
        assert!(step
            .format()
            .contains("X^2 = 015241578753238836527968299765279684"));
        assert!((step.value - 0.753238836527968299).abs() < 1e-15);
    }

    #[test]
    fn test_middle_square_steps() {
        let mut g = MiddleSquare::with_digits(42, 4, Normalization::PowerOfTen).unwrap();
        let steps = g.steps(2);
        assert_eq!(steps[0].square, 1764);
        assert_eq!(steps[0].next, 17);
        assert_eq!(
            steps[0].format(),
            "X = 0042     X^2 = 00001764     middle = 0017"
        );
        assert_eq!(steps[1].state, 17);
        assert_eq!(steps[1].value, 0.0002);
    }

    #[test]
    fn test_middle_square_max_value_normalization() {
        let values = middle_square::generate(5735, 1, Normalization::MaxValue).unwrap();
        assert!((values[0] - 8902.0 / 9999.0).abs() < 1e-15);
    }

    #[test]
    fn test_middle_square_collapse_is_kept() {
        // 10^2 = 0100 -> 10 for two digits is a fixed point, 0 stays 0.
        let values = middle_square::generate(10, 3, Normalization::PowerOfTen).unwrap();
        assert_eq!(values, vec![0.1, 0.1, 0.1]);
        let mut g = MiddleSquare::with_digits(0, 4, Normalization::PowerOfTen).unwrap();
        assert_eq!(g.sample(5), vec![0.0; 5]);
    }

    #[test]
    fn test_middle_square_rejects_odd_digits() {
        assert!(matches!(
            MiddleSquare::new(123, Normalization::PowerOfTen),
            Err(StatError::InvalidSeed { seed: 123, .. })
        ));
        assert!(matches!(
            MiddleSquare::with_digits(12345, 4, Normalization::PowerOfTen),
            Err(StatError::InvalidSeed { .. })
        ));
        assert!(matches!(
            MiddleSquare::with_digits(1, 20, Normalization::PowerOfTen),
            Err(StatError::InvalidSeed { .. })
        ));
    }

    #[test]
    fn test_middle_square_reset() {
        let mut g = MiddleSquare::new(5735, Normalization::PowerOfTen).unwrap();
        let first = g.sample(10);
        g.reset();
        assert_eq!(first, g.sample(10));
    }

    #[test]
    fn test_lcg_known_sequence() {
        let values = lcg::generate(7, 5, 16, 4).unwrap();
        assert_eq!(values, vec![3.0 / 16.0, 15.0 / 16.0, 11.0 / 16.0, 7.0 / 16.0]);
    }

    #[test]
    fn test_lcg_steps() {
        let mut g = lcg::Lcg::new(7, 5, 16).unwrap();
        let steps = g.steps(2);
        assert_eq!(steps[0].product, 35);
        assert_eq!(steps[0].next, 3);
        assert_eq!(steps[0].format(), "X = (5 * 7) mod 16 = 35 mod 16 = 3");
        assert_eq!(steps[1].state, 3);
        assert_eq!(steps[1].value, 15.0 / 16.0);
    }

    #[test]
    fn test_lcg_negative_operands() {
        // -7 * 5 = -35, floor mod 16 = 13
        let mut g = lcg::Lcg::new(-7, 5, 16).unwrap();
        assert_eq!(g.next_raw(), 13);
    }

    #[test]
    fn test_lcg_rejects_modulus() {
        assert_eq!(lcg::generate(1, 5, 0, 3), Err(StatError::InvalidModulus(0)));
        assert_eq!(lcg::generate(1, 5, -4, 3), Err(StatError::InvalidModulus(-4)));
    }

    #[test]
    fn test_lcg_cycle_length() {
        let g = lcg::Lcg::new(7, 5, 16).unwrap();
        assert_eq!(g.cycle_length(100), Some(4));
        // Multiplier 0 collapses to a fixed point.
        let g = lcg::Lcg::new(3, 0, 16).unwrap();
        assert_eq!(g.cycle_length(100), Some(1));
        let g = lcg::Lcg::new(1, 16807, 2147483647).unwrap();
        assert_eq!(g.cycle_length(1000), None);
    }

    #[test]
    fn test_reference_rand_reset() {
        let mut r = ReferenceRand::new(42);
        let first = r.sample(8);
        assert!(first.iter().all(|u| (0.0..1.0).contains(u)));
        r.reset();
        assert_eq!(first, r.sample(8));
    }
}
