// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Collection of methods for statistical analysis.
//!
//! Every test validates its input before computing anything and returns a
//! `TestResult` carrying the statistic, the rejection threshold, the verdict
//! and the series needed to plot it.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    conditioning,
    distributions::{self, kolmogorov_sf},
    errors::StatError,
    rng_testing::{CriticalValue, Series, TestKind, TestResult, Verdict, Workings},
    utils,
};

pub const DEFAULT_ALPHA: f64 = 0.05;

/// Mean of U(0, 1).
pub const UNIFORM_MEAN: f64 = 0.5;
/// Variance of U(0, 1).
pub const UNIFORM_VARIANCE: f64 = 1.0 / 12.0;

/// Points per density curve.
const CURVE_POINTS: usize = 100;
/// The normal approximation of the uniform mean test wants this many values.
const LARGE_SAMPLE: usize = 30;

fn check_alpha(alpha: f64) -> Result<(), StatError> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(StatError::InvalidSignificance(alpha))
    }
}

fn check_size(sample: &[f64], needed: usize) -> Result<(), StatError> {
    if sample.len() < needed {
        return Err(StatError::EmptySample {
            needed,
            actual: sample.len(),
        });
    }
    Ok(())
}

fn check_parameter(name: &'static str, value: f64) -> Result<(), StatError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StatError::NonFiniteParameter { name, value })
    }
}

fn check_finite(sample: &[f64]) -> Result<(), StatError> {
    match sample.iter().position(|value| !value.is_finite()) {
        Some(index) => Err(StatError::NonFiniteValue { index }),
        None => Ok(()),
    }
}

/// Arithmetic mean, None for an empty sample.
pub fn mean(sample: &[f64]) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    Some(sample.iter().sum::<f64>() / sample.len() as f64)
}

/// Sample variance with Bessel's correction, None for fewer than two values.
pub fn sample_variance(sample: &[f64]) -> Option<f64> {
    if sample.len() < 2 {
        return None;
    }
    let mean = mean(sample)?;
    let squares: f64 = sample.iter().map(|x| (x - mean).powi(2)).sum();
    Some(squares / (sample.len() - 1) as f64)
}

fn density_curve(
    x: &[f64],
    pdf: impl Fn(f64) -> Result<f64, StatError>,
) -> Result<Vec<f64>, StatError> {
    x.iter().map(|&x| pdf(x)).collect()
}

/// Two sided p value of a statistic with symmetric reference CDF.
fn two_sided_p(cdf_of_abs: f64) -> f64 {
    (2.0 * (1.0 - cdf_of_abs)).clamp(0.0, 1.0)
}

/// Observed counts per interval for the chi squared uniformity test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    observed: Vec<u64>,
}

impl FrequencyTable {
    /// Validate 'observed' against the declared number of intervals.
    pub fn new(intervals: usize, observed: &[i64]) -> Result<Self, StatError> {
        if intervals <= 1 {
            return Err(StatError::TooFewIntervals(intervals));
        }
        if observed.len() != intervals {
            return Err(StatError::CountMismatch {
                expected: intervals,
                actual: observed.len(),
            });
        }
        if let Some((index, &value)) = observed.iter().enumerate().find(|&(_, &v)| v < 0) {
            return Err(StatError::NegativeFrequency { index, value });
        }
        Self::from_counts(observed.iter().map(|&v| v as u64).collect())
    }

    /// Bin a [0, 1] sample into 'intervals' equal-width intervals.
    pub fn from_sample(sample: &[f64], intervals: usize) -> Result<Self, StatError> {
        Self::from_counts(conditioning::bin_unit_interval(sample, intervals)?)
    }

    fn from_counts(observed: Vec<u64>) -> Result<Self, StatError> {
        if observed.len() <= 1 {
            return Err(StatError::TooFewIntervals(observed.len()));
        }
        let total = observed
            .iter()
            .try_fold(0u64, |total, &o| total.checked_add(o))
            .ok_or(StatError::FrequencyOverflow)?;
        if total == 0 {
            return Err(StatError::EmptySample {
                needed: 1,
                actual: 0,
            });
        }
        Ok(FrequencyTable { observed })
    }

    pub fn intervals(&self) -> usize {
        self.observed.len()
    }

    pub fn observed(&self) -> &[u64] {
        &self.observed
    }

    /// Cannot overflow, construction checks the sum.
    pub fn total(&self) -> u64 {
        self.observed.iter().sum()
    }

    /// Expected count per interval under the uniform null hypothesis.
    pub fn expected(&self) -> f64 {
        self.total() as f64 / self.intervals() as f64
    }
}

/// Chi squared goodness of fit against equal expected counts.
/// Rejects if the statistic reaches the 1 - alpha quantile with k - 1 degrees of freedom.
pub fn chi_square_uniformity(table: &FrequencyTable, alpha: f64) -> Result<TestResult, StatError> {
    check_alpha(alpha)?;
    let expected = table.expected();
    let contributions: Vec<f64> = table
        .observed()
        .iter()
        .map(|&o| (o as f64 - expected).powi(2) / expected)
        .collect();
    let chi_squared: f64 = contributions.iter().sum();
    let df = (table.intervals() - 1) as f64;
    let critical = distributions::chi_squared_ppf(df, 1.0 - alpha)?;
    let p = distributions::chi_squared_sf(df, chi_squared)?;
    debug!(chi_squared, df, critical, p, "chi squared uniformity");
    Ok(TestResult {
        kind: TestKind::ChiSquareUniformity,
        sample_size: table.total() as usize,
        statistic: chi_squared,
        degrees_of_freedom: Some(df),
        critical_value: Some(CriticalValue::Upper(critical)),
        p_value: Some(p),
        alpha,
        verdict: Verdict::from_rejection(chi_squared >= critical),
        series: Series::Frequencies {
            observed: table.observed().iter().map(|&o| o as f64).collect(),
            expected: vec![expected; table.intervals()],
        },
        workings: Workings::Contributions {
            expected,
            contributions,
        },
    })
}

/// Chi squared uniformity test straight from raw counts.
pub fn chi_square_uniformity_counts(
    intervals: usize,
    observed: &[i64],
    alpha: f64,
) -> Result<TestResult, StatError> {
    chi_square_uniformity(&FrequencyTable::new(intervals, observed)?, alpha)
}

/// Two sided Kolmogorov-Smirnov test against U(0, 1).
pub fn ks_uniformity(sample: &[f64], alpha: f64) -> Result<TestResult, StatError> {
    check_alpha(alpha)?;
    check_size(sample, 1)?;
    check_finite(sample)?;
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;
    // Uniform CDF, 0 below the interval and 1 above.
    let theoretical: Vec<f64> = sorted.iter().map(|u| u.clamp(0.0, 1.0)).collect();
    let above: Vec<f64> = theoretical
        .iter()
        .enumerate()
        .map(|(i, &f)| (i + 1) as f64 / n - f)
        .collect();
    let below: Vec<f64> = theoretical
        .iter()
        .enumerate()
        .map(|(i, &f)| f - i as f64 / n)
        .collect();
    let d = above.iter().chain(below.iter()).fold(0.0, |d: f64, &x| d.max(x));
    let p = kolmogorov_sf(sorted.len(), d);
    debug!(d, p, n = sorted.len(), "kolmogorov-smirnov uniformity");
    let empirical = (1..=sorted.len()).map(|i| i as f64 / n).collect();
    Ok(TestResult {
        kind: TestKind::KolmogorovSmirnov,
        sample_size: sorted.len(),
        statistic: d,
        degrees_of_freedom: None,
        critical_value: None,
        p_value: Some(p),
        alpha,
        verdict: Verdict::from_rejection(p < alpha),
        series: Series::Cdf {
            sorted,
            empirical,
            theoretical,
        },
        workings: Workings::Differences { above, below },
    })
}

/// Mean test against 'hypothesized_mean'.
/// With a known population standard deviation this is a Z test,
/// otherwise a t test with n - 1 degrees of freedom.
pub fn mean_test(
    sample: &[f64],
    hypothesized_mean: f64,
    population_std_dev: Option<f64>,
    alpha: f64,
) -> Result<TestResult, StatError> {
    check_alpha(alpha)?;
    check_parameter("hypothesized_mean", hypothesized_mean)?;
    check_size(sample, 1)?;
    check_finite(sample)?;
    let n = sample.len() as f64;
    let sample_mean = mean(sample).unwrap_or_default();

    let (kind, sample_std_dev, standard_error, df) = match population_std_dev {
        Some(sigma) => (TestKind::ZMean, None, sigma / n.sqrt(), None),
        None => {
            check_size(sample, 2)?;
            let s = sample_variance(sample).unwrap_or_default().sqrt();
            (TestKind::TMean, Some(s), s / n.sqrt(), Some(n - 1.0))
        }
    };
    if !(standard_error.is_finite() && standard_error > 0.0) {
        return Err(StatError::DegenerateVariance(standard_error));
    }
    let statistic = (sample_mean - hypothesized_mean) / standard_error;

    let (p, critical) = match df {
        None => (
            two_sided_p(distributions::normal_cdf(statistic.abs())?),
            distributions::normal_ppf(1.0 - alpha / 2.0)?,
        ),
        Some(df) => (
            two_sided_p(distributions::students_t_cdf(df, statistic.abs())?),
            distributions::students_t_ppf(df, 1.0 - alpha / 2.0)?,
        ),
    };
    debug!(
        test = kind.name(),
        sample_mean,
        standard_error,
        statistic,
        p,
        "mean test"
    );

    let reach = statistic.abs().max(critical).max(4.0);
    let x = utils::linspace(-reach, reach, CURVE_POINTS);
    let density = match df {
        None => density_curve(&x, |x| distributions::normal_pdf(x, 0.0, 1.0))?,
        Some(df) => density_curve(&x, |x| distributions::students_t_pdf(df, x))?,
    };
    Ok(TestResult {
        kind,
        sample_size: sample.len(),
        statistic,
        degrees_of_freedom: df,
        critical_value: Some(CriticalValue::Symmetric(critical)),
        p_value: Some(p),
        alpha,
        verdict: Verdict::from_rejection(p < alpha),
        series: Series::Density {
            x,
            density,
            marker: statistic,
        },
        workings: Workings::StandardError {
            sample_mean,
            sample_std_dev,
            standard_error,
        },
    })
}

/// Mean test of a [0, 1] sample against U(0, 1), mean 1/2 and variance 1/12.
/// The null hypothesis is kept if the sample mean lies inside the
/// 1 - alpha confidence interval around 1/2.
pub fn uniform_mean_test(sample: &[f64], alpha: f64) -> Result<TestResult, StatError> {
    check_alpha(alpha)?;
    check_size(sample, 1)?;
    for (index, &value) in sample.iter().enumerate() {
        if !value.is_finite() {
            return Err(StatError::NonFiniteValue { index });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(StatError::OutOfRange { index, value });
        }
    }
    if sample.len() < LARGE_SAMPLE {
        warn!(
            n = sample.len(),
            "the normal approximation assumes at least {LARGE_SAMPLE} values"
        );
    }
    let n = sample.len() as f64;
    let sample_mean = mean(sample).unwrap_or_default();
    let standard_error = (UNIFORM_VARIANCE / n).sqrt();
    let z0 = (sample_mean - UNIFORM_MEAN) / standard_error;
    let z_critical = distributions::normal_ppf(1.0 - alpha / 2.0)?;
    let lower = UNIFORM_MEAN - z_critical * standard_error;
    let upper = UNIFORM_MEAN + z_critical * standard_error;
    let within = lower <= sample_mean && sample_mean <= upper;
    let p = two_sided_p(distributions::normal_cdf(z0.abs())?);
    debug!(sample_mean, z0, lower, upper, within, "uniform mean test");

    let x = utils::linspace(
        UNIFORM_MEAN - 4.0 * standard_error,
        UNIFORM_MEAN + 4.0 * standard_error,
        CURVE_POINTS,
    );
    let density = density_curve(&x, |x| {
        distributions::normal_pdf(x, UNIFORM_MEAN, standard_error)
    })?;
    Ok(TestResult {
        kind: TestKind::UniformMean,
        sample_size: sample.len(),
        statistic: z0,
        degrees_of_freedom: None,
        critical_value: Some(CriticalValue::Interval { lower, upper }),
        p_value: Some(p),
        alpha,
        verdict: Verdict::from_rejection(!within),
        series: Series::Density {
            x,
            density,
            marker: sample_mean,
        },
        workings: Workings::StandardError {
            sample_mean,
            sample_std_dev: None,
            standard_error,
        },
    })
}

/// Two tailed chi squared test of the sample variance against 'hypothesized_variance'.
/// Keeps the null hypothesis inside the alpha/2 and 1 - alpha/2 quantiles.
pub fn variance_test(
    sample: &[f64],
    hypothesized_variance: f64,
    alpha: f64,
) -> Result<TestResult, StatError> {
    check_alpha(alpha)?;
    check_size(sample, 2)?;
    if !(hypothesized_variance.is_finite() && hypothesized_variance > 0.0) {
        return Err(StatError::DegenerateHypothesis(hypothesized_variance));
    }
    check_finite(sample)?;
    let df = (sample.len() - 1) as f64;
    let variance = sample_variance(sample).unwrap_or_default();
    let chi_squared = df * variance / hypothesized_variance;
    let lower = distributions::chi_squared_ppf(df, alpha / 2.0)?;
    let upper = distributions::chi_squared_ppf(df, 1.0 - alpha / 2.0)?;
    let cdf = distributions::chi_squared_cdf(df, chi_squared)?;
    let p = (2.0 * cdf.min(1.0 - cdf)).clamp(0.0, 1.0);
    debug!(variance, chi_squared, df, lower, upper, p, "chi squared variance");

    let reach = 1.5 * distributions::chi_squared_ppf(df, 0.99)?;
    let x = utils::linspace(0.0, reach, CURVE_POINTS);
    let density = density_curve(&x, |x| distributions::chi_squared_pdf(df, x))?;
    Ok(TestResult {
        kind: TestKind::ChiSquareVariance,
        sample_size: sample.len(),
        statistic: chi_squared,
        degrees_of_freedom: Some(df),
        critical_value: Some(CriticalValue::Interval { lower, upper }),
        p_value: Some(p),
        alpha,
        verdict: Verdict::from_rejection(chi_squared < lower || chi_squared > upper),
        series: Series::Density {
            x,
            density,
            marker: chi_squared,
        },
        workings: Workings::SampleVariance {
            sample_mean: mean(sample).unwrap_or_default(),
            sample_variance: variance,
        },
    })
}
