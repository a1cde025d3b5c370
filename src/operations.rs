// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Every procedure as a tagged value with its own parameter struct.
//! A batch of operations can be read from JSON and run in order.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    errors::StatError,
    rng_testing::TestResult,
    rngs::{
        lcg::{self, Lcg},
        middle_square::{self, MiddleSquare, Normalization},
        Generator,
    },
    stats::{self, DEFAULT_ALPHA},
};

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddleSquareParams {
    pub seed: u64,
    pub count: usize,
    /// Fixed state width, the seed's own digit count if absent.
    #[serde(default)]
    pub digits: Option<u32>,
    #[serde(default)]
    pub normalization: Normalization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcgParams {
    pub seed: i64,
    pub multiplier: i64,
    pub modulus: i64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareParams {
    pub intervals: usize,
    pub observed: Vec<i64>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleParams {
    pub sample: Vec<f64>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanTestParams {
    pub sample: Vec<f64>,
    pub hypothesized_mean: f64,
    #[serde(default)]
    pub population_std_dev: Option<f64>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceTestParams {
    pub sample: Vec<f64>,
    pub hypothesized_variance: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    MiddleSquare(MiddleSquareParams),
    Lcg(LcgParams),
    ChiSquareUniformity(ChiSquareParams),
    KsUniformity(SampleParams),
    MeanTest(MeanTestParams),
    UniformMeanTest(SampleParams),
    VarianceTest(VarianceTestParams),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    MiddleSquare(Vec<middle_square::Step>),
    Lcg(Vec<lcg::Step>),
    Test(TestResult),
}

impl Outcome {
    /// Generated values, None for a test.
    pub fn values(&self) -> Option<Vec<f64>> {
        match self {
            Outcome::MiddleSquare(steps) => Some(steps.iter().map(|s| s.value).collect()),
            Outcome::Lcg(steps) => Some(steps.iter().map(|s| s.value).collect()),
            Outcome::Test(_) => None,
        }
    }
}

impl Operation {
    /// Stable identifier, matches the serialized tag.
    pub fn id(&self) -> &'static str {
        match self {
            Operation::MiddleSquare(_) => "middle_square",
            Operation::Lcg(_) => "lcg",
            Operation::ChiSquareUniformity(_) => "chi_square_uniformity",
            Operation::KsUniformity(_) => "ks_uniformity",
            Operation::MeanTest(_) => "mean_test",
            Operation::UniformMeanTest(_) => "uniform_mean_test",
            Operation::VarianceTest(_) => "variance_test",
        }
    }

    pub fn run(&self) -> Result<Outcome, StatError> {
        info!(operation = self.id(), "running operation");
        let outcome = match self {
            Operation::MiddleSquare(p) => {
                let mut generator = match p.digits {
                    Some(digits) => MiddleSquare::with_digits(p.seed, digits, p.normalization)?,
                    None => MiddleSquare::new(p.seed, p.normalization)?,
                };
                Outcome::MiddleSquare(generator.steps(p.count))
            }
            Operation::Lcg(p) => {
                Outcome::Lcg(Lcg::new(p.seed, p.multiplier, p.modulus)?.steps(p.count))
            }
            Operation::ChiSquareUniformity(p) => Outcome::Test(
                stats::chi_square_uniformity_counts(p.intervals, &p.observed, p.alpha)?,
            ),
            Operation::KsUniformity(p) => Outcome::Test(stats::ks_uniformity(&p.sample, p.alpha)?),
            Operation::MeanTest(p) => Outcome::Test(stats::mean_test(
                &p.sample,
                p.hypothesized_mean,
                p.population_std_dev,
                p.alpha,
            )?),
            Operation::UniformMeanTest(p) => {
                Outcome::Test(stats::uniform_mean_test(&p.sample, p.alpha)?)
            }
            Operation::VarianceTest(p) => Outcome::Test(stats::variance_test(
                &p.sample,
                p.hypothesized_variance,
                p.alpha,
            )?),
        };
        Ok(outcome)
    }
}

/// Parse a JSON array of operations.
pub fn parse_batch(json: &str) -> Result<Vec<Operation>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Build the generator an operation describes, for use in a battery.
pub fn generator_for(operation: &Operation) -> Option<Result<Box<dyn Generator>, StatError>> {
    match operation {
        Operation::MiddleSquare(p) => Some(
            match p.digits {
                Some(digits) => MiddleSquare::with_digits(p.seed, digits, p.normalization),
                None => MiddleSquare::new(p.seed, p.normalization),
            }
            .map(|g| Box::new(g) as Box<dyn Generator>),
        ),
        Operation::Lcg(p) => Some(
            Lcg::new(p.seed, p.multiplier, p.modulus).map(|g| Box::new(g) as Box<dyn Generator>),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng_testing::Verdict;

    #[test]
    fn test_parse_and_run_batch() {
        let json = r#"[
            {"operation": "lcg", "seed": 7, "multiplier": 5, "modulus": 16, "count": 4},
            {"operation": "chi_square_uniformity", "intervals": 4, "observed": [8, 12, 10, 10]},
            {"operation": "mean_test", "sample": [0.5, 0.5, 0.5], "hypothesized_mean": 0.5,
             "population_std_dev": 0.1, "alpha": 0.01}
        ]"#;
        let ops = parse_batch(json).unwrap();
        let ids: Vec<&str> = ops.iter().map(|op| op.id()).collect();
        assert_eq!(ids, vec!["lcg", "chi_square_uniformity", "mean_test"]);

        assert_eq!(
            ops[0].run().unwrap().values(),
            Some(vec![3.0 / 16.0, 15.0 / 16.0, 11.0 / 16.0, 7.0 / 16.0])
        );
        match ops[1].run().unwrap() {
            Outcome::Test(r) => {
                assert_eq!(r.alpha(), DEFAULT_ALPHA);
                assert_eq!(r.verdict(), Verdict::FailToReject);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        match ops[2].run().unwrap() {
            Outcome::Test(r) => assert_eq!(r.alpha(), 0.01),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_generator_outcome_keeps_steps() {
        let op = Operation::MiddleSquare(MiddleSquareParams {
            seed: 5735,
            count: 2,
            digits: None,
            normalization: Normalization::PowerOfTen,
        });
        match op.run().unwrap() {
            Outcome::MiddleSquare(steps) => {
                assert_eq!(steps[0].square, 32890225);
                assert_eq!(steps[1].state, 8902);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(
            op.run().unwrap().values(),
            Some(middle_square::generate(5735, 2, Normalization::PowerOfTen).unwrap())
        );
    }

    #[test]
    fn test_id_matches_serialized_tag() {
        let op = Operation::VarianceTest(VarianceTestParams {
            sample: vec![1.0, 2.0, 3.0],
            hypothesized_variance: 1.0,
            alpha: 0.05,
        });
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["operation"], op.id());
    }

    #[test]
    fn test_errors_propagate() {
        let op = Operation::MiddleSquare(MiddleSquareParams {
            seed: 123,
            count: 3,
            digits: None,
            normalization: Normalization::PowerOfTen,
        });
        assert!(matches!(op.run(), Err(StatError::InvalidSeed { .. })));
        assert!(matches!(
            generator_for(&op),
            Some(Err(StatError::InvalidSeed { .. }))
        ));
    }

    #[test]
    fn test_generator_for_tests_is_none() {
        let op = Operation::KsUniformity(SampleParams {
            sample: vec![0.5],
            alpha: 0.05,
        });
        assert!(generator_for(&op).is_none());
    }
}
