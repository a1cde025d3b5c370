// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Test results and statistical testing of a generators output.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::Settings,
    errors::StatError,
    rngs::Generator,
    stats::{self, FrequencyTable},
    strings, utils,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    ChiSquareUniformity,
    KolmogorovSmirnov,
    ZMean,
    TMean,
    UniformMean,
    ChiSquareVariance,
}

impl TestKind {
    pub fn name(&self) -> &'static str {
        strings::TEST_NAMES[*self as usize]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Reject,
    FailToReject,
}

impl Verdict {
    pub fn from_rejection(reject: bool) -> Self {
        if reject {
            Verdict::Reject
        } else {
            Verdict::FailToReject
        }
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Verdict::Reject)
    }
}

/// Rejection threshold of a test.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalValue {
    /// Reject if the statistic reaches the value.
    Upper(f64),
    /// Reject if the absolute statistic exceeds the value.
    Symmetric(f64),
    /// Keep the null hypothesis inside [lower, upper].
    Interval { lower: f64, upper: f64 },
}

/// Numeric series a presentation layer needs to draw the test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Series {
    /// Observed vs expected count per interval.
    Frequencies {
        observed: Vec<f64>,
        expected: Vec<f64>,
    },
    /// Sorted sample with empirical and theoretical CDF at each point.
    Cdf {
        sorted: Vec<f64>,
        empirical: Vec<f64>,
        theoretical: Vec<f64>,
    },
    /// Reference density and the position of the observed value.
    Density {
        x: Vec<f64>,
        density: Vec<f64>,
        marker: f64,
    },
}

/// Intermediate values a test computed on the way to its statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Workings {
    /// (O - E)^2 / E per interval.
    Contributions { expected: f64, contributions: Vec<f64> },
    /// i/n - F(u_i) and F(u_i) - (i-1)/n over the sorted sample.
    Differences { above: Vec<f64>, below: Vec<f64> },
    StandardError {
        sample_mean: f64,
        /// Only present when estimated from the sample.
        sample_std_dev: Option<f64>,
        standard_error: f64,
    },
    SampleVariance { sample_mean: f64, sample_variance: f64 },
}

fn format_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{:.4}", v)).collect();
    format!("[{}]", items.join(", "))
}

impl Workings {
    /// Human readable lines, one per intermediate quantity.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Workings::Contributions {
                expected,
                contributions,
            } => {
                let mut lines = vec![format!("E = n / k = {:.4}", expected)];
                lines.extend(
                    contributions
                        .iter()
                        .enumerate()
                        .map(|(i, c)| format!("interval {}: (O - E)^2 / E = {:.4}", i + 1, c)),
                );
                lines
            }
            Workings::Differences { above, below } => vec![
                format!("i/n - F(u) = {}", format_list(above)),
                format!("F(u) - (i-1)/n = {}", format_list(below)),
            ],
            Workings::StandardError {
                sample_mean,
                sample_std_dev,
                standard_error,
            } => {
                let mut lines = vec![format!("mean = {:.4}", sample_mean)];
                if let Some(s) = sample_std_dev {
                    lines.push(format!("s = {:.4}", s));
                }
                lines.push(format!("standard error = {:.4}", standard_error));
                lines
            }
            Workings::SampleVariance {
                sample_mean,
                sample_variance,
            } => vec![
                format!("mean = {:.4}", sample_mean),
                format!("s^2 = {:.4}", sample_variance),
            ],
        }
    }
}

/// Outcome of a single hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub(crate) kind: TestKind,
    pub(crate) sample_size: usize,
    pub(crate) statistic: f64,
    pub(crate) degrees_of_freedom: Option<f64>,
    pub(crate) critical_value: Option<CriticalValue>,
    pub(crate) p_value: Option<f64>,
    pub(crate) alpha: f64,
    pub(crate) verdict: Verdict,
    pub(crate) series: Series,
    pub(crate) workings: Workings,
}

impl TestResult {
    pub fn kind(&self) -> TestKind {
        self.kind
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn statistic(&self) -> f64 {
        self.statistic
    }

    pub fn degrees_of_freedom(&self) -> Option<f64> {
        self.degrees_of_freedom
    }

    pub fn critical_value(&self) -> Option<CriticalValue> {
        self.critical_value
    }

    pub fn p_value(&self) -> Option<f64> {
        self.p_value
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn rejected(&self) -> bool {
        self.verdict.is_reject()
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn workings(&self) -> &Workings {
        &self.workings
    }

    pub fn format(&self) -> String {
        let df = self
            .degrees_of_freedom
            .map_or_else(String::new, |df| format!("     df: {}", df));
        let critical = match self.critical_value {
            Some(CriticalValue::Upper(c)) => format!("     crit: {:.4}", c),
            Some(CriticalValue::Symmetric(c)) => format!("     crit: ±{:.4}", c),
            Some(CriticalValue::Interval { lower, upper }) => {
                format!("     crit: [{:.4}, {:.4}]", lower, upper)
            }
            None => String::new(),
        };
        let p = self
            .p_value
            .map_or_else(String::new, |p| format!("     p: {:.6}", p));
        format!(
            "{:<10}: n: {}     stat: {:.6}{}{}{}     alpha: {}   - {}",
            self.kind.name(),
            self.sample_size,
            self.statistic,
            df,
            critical,
            p,
            self.alpha,
            if self.rejected() {
                strings::FAIL_STR
            } else {
                strings::PASS_STR
            }
        )
    }

    pub fn explanation(&self) -> &'static str {
        if self.rejected() {
            strings::REJECT_EXPLANATION
        } else {
            strings::KEEP_EXPLANATION
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuiteEntry {
    pub result: TestResult,
    pub time_used: Duration,
}

impl SuiteEntry {
    pub fn format(&self) -> String {
        format!(
            "{}     Time: {}",
            self.result.format(),
            utils::format_elapsed_time(self.time_used)
        )
    }
}

#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub rng_name: String,
    pub sample: Vec<f64>,
    pub entries: Vec<SuiteEntry>,
    pub time_used: Duration,
}

impl SuiteReport {
    pub fn passed_tests(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.result.rejected())
            .count()
    }

    pub fn passed(&self) -> bool {
        self.passed_tests() == self.entries.len()
    }
}

/// Run a test and return the result and excution time.
fn run_single_test(
    test: impl FnOnce() -> Result<TestResult, StatError>,
) -> Result<SuiteEntry, StatError> {
    let start = Instant::now();
    let result = test()?;
    let time_used = start.elapsed();
    Ok(SuiteEntry { result, time_used })
}

/// Draw `settings.battery_size` values from the generator and run the
/// chi squared, Kolmogorov-Smirnov and uniform mean tests on them.
/// The generator is reset first, so repeated runs see the same sample.
pub fn test_suite(
    test_rng: &mut impl Generator,
    settings: &Settings,
    rng_name: &str,
) -> Result<SuiteReport, StatError> {
    settings.validate()?;
    let full_start = Instant::now();
    test_rng.reset();
    let sample = test_rng.sample(settings.battery_size);
    info!(rng_name, size = sample.len(), "running generator battery");

    let entries = vec![
        run_single_test(|| {
            let table = FrequencyTable::from_sample(&sample, settings.bins)?;
            stats::chi_square_uniformity(&table, settings.alpha)
        })?,
        run_single_test(|| stats::ks_uniformity(&sample, settings.alpha))?,
        run_single_test(|| stats::uniform_mean_test(&sample, settings.alpha))?,
    ];

    Ok(SuiteReport {
        rng_name: rng_name.to_owned(),
        sample,
        entries,
        time_used: full_start.elapsed(),
    })
}

/// Format a `SuiteReport` as a summary of the results.
pub fn format_suite_summary(report: &SuiteReport) -> String {
    format!(
        "Overall result for {}: {}          ( {} / {} passed, {} )",
        report.rng_name,
        if report.passed() {
            strings::PASS_STR
        } else {
            strings::FAIL_STR
        },
        report.passed_tests(),
        report.entries.len(),
        utils::format_elapsed_time(report.time_used)
    )
}
