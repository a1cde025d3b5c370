// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Reference distributions for the hypothesis tests.
//! Normal, chi squared and Student's t are taken from statrs,
//! the Kolmogorov distribution is computed here.

use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF, Normal, StudentsT};

use crate::errors::StatError;

fn distribution_error(err: impl std::fmt::Display) -> StatError {
    StatError::Distribution(err.to_string())
}

pub fn normal(mean: f64, std_dev: f64) -> Result<Normal, StatError> {
    Normal::new(mean, std_dev).map_err(distribution_error)
}

pub fn chi_squared(df: f64) -> Result<ChiSquared, StatError> {
    ChiSquared::new(df).map_err(distribution_error)
}

pub fn students_t(df: f64) -> Result<StudentsT, StatError> {
    StudentsT::new(0.0, 1.0, df).map_err(distribution_error)
}

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> Result<f64, StatError> {
    Ok(normal(0.0, 1.0)?.cdf(z))
}

/// Standard normal quantile.
pub fn normal_ppf(p: f64) -> Result<f64, StatError> {
    Ok(normal(0.0, 1.0)?.inverse_cdf(p))
}

pub fn normal_pdf(x: f64, mean: f64, std_dev: f64) -> Result<f64, StatError> {
    Ok(normal(mean, std_dev)?.pdf(x))
}

pub fn chi_squared_cdf(df: f64, x: f64) -> Result<f64, StatError> {
    Ok(chi_squared(df)?.cdf(x))
}

/// Right tail probability P(X >= x).
pub fn chi_squared_sf(df: f64, x: f64) -> Result<f64, StatError> {
    Ok(chi_squared(df)?.sf(x))
}

pub fn chi_squared_ppf(df: f64, p: f64) -> Result<f64, StatError> {
    Ok(chi_squared(df)?.inverse_cdf(p))
}

pub fn chi_squared_pdf(df: f64, x: f64) -> Result<f64, StatError> {
    Ok(chi_squared(df)?.pdf(x))
}

pub fn students_t_cdf(df: f64, t: f64) -> Result<f64, StatError> {
    Ok(students_t(df)?.cdf(t))
}

pub fn students_t_ppf(df: f64, p: f64) -> Result<f64, StatError> {
    Ok(students_t(df)?.inverse_cdf(p))
}

pub fn students_t_pdf(df: f64, t: f64) -> Result<f64, StatError> {
    Ok(students_t(df)?.pdf(t))
}

/// Largest sample size evaluated with the exact matrix method.
pub const KOLMOGOROV_EXACT_LIMIT: usize = 1000;

const SCALE: f64 = 1e140;
const SCALE_EXPONENT: i32 = 140;

fn matrix_multiply(a: &[f64], b: &[f64], m: usize) -> Vec<f64> {
    let mut c = vec![0.0; m * m];
    for i in 0..m {
        for k in 0..m {
            let a_ik = a[i * m + k];
            if a_ik == 0.0 {
                continue;
            }
            for j in 0..m {
                c[i * m + j] += a_ik * b[k * m + j];
            }
        }
    }
    c
}

/// Raise 'a' to the power 'n' while tracking a decimal exponent
/// to keep the entries representable.
fn matrix_power(a: &[f64], m: usize, n: usize) -> (Vec<f64>, i32) {
    if n == 1 {
        return (a.to_vec(), 0);
    }
    let (half, half_exponent) = matrix_power(a, m, n / 2);
    let squared = matrix_multiply(&half, &half, m);
    let (mut v, mut exponent) = if n % 2 == 0 {
        (squared, 2 * half_exponent)
    } else {
        (matrix_multiply(a, &squared, m), 2 * half_exponent)
    };
    if v[(m / 2) * m + m / 2] > SCALE {
        for x in v.iter_mut() {
            *x /= SCALE;
        }
        exponent += SCALE_EXPONENT;
    }
    (v, exponent)
}

/// P(D_n < d) for the one sample Kolmogorov statistic.
/// Marsaglia, Tsang & Wang (2003), "Evaluating Kolmogorov's Distribution".
fn kolmogorov_cdf_exact(n: usize, d: f64) -> f64 {
    let nf = n as f64;
    let s = d * d * nf;
    if s > 7.24 || (s > 3.76 && n > 99) {
        return 1.0 - 2.0 * (-(2.000071 + 0.331 / nf.sqrt() + 1.409 / nf) * s).exp();
    }
    let k = (nf * d) as usize + 1;
    let m = 2 * k - 1;
    let h = k as f64 - nf * d;

    let mut hm = vec![0.0; m * m];
    for i in 0..m {
        for j in 0..m {
            if j <= i + 1 {
                hm[i * m + j] = 1.0;
            }
        }
    }
    for i in 0..m {
        hm[i * m] -= h.powi(i as i32 + 1);
        hm[(m - 1) * m + i] -= h.powi((m - i) as i32);
    }
    if 2.0 * h - 1.0 > 0.0 {
        hm[(m - 1) * m] += (2.0 * h - 1.0).powi(m as i32);
    }
    for i in 0..m {
        for j in 0..=i {
            for g in 1..=(i + 1 - j) {
                hm[i * m + j] /= g as f64;
            }
        }
    }

    let (q, mut exponent) = matrix_power(&hm, m, n);
    let mut value = q[(k - 1) * m + k - 1];
    for i in 1..=n {
        value = value * i as f64 / nf;
        if value < 1.0 / SCALE {
            value *= SCALE;
            exponent -= SCALE_EXPONENT;
        }
    }
    value * 10f64.powi(exponent)
}

/// Limiting Kolmogorov distribution P(K <= lambda).
fn kolmogorov_limit_cdf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 0.0;
    }
    if lambda < 1.18 {
        let factor = (2.0 * std::f64::consts::PI).sqrt() / lambda;
        let base = -std::f64::consts::PI.powi(2) / (8.0 * lambda * lambda);
        let sum: f64 = (1..=50)
            .map(|k| (((2 * k - 1) as f64).powi(2) * base).exp())
            .sum();
        factor * sum
    } else {
        let mut tail = 0.0;
        for k in 1..=100i32 {
            let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
            tail += sign * (-2.0 * (k as f64 * lambda).powi(2)).exp();
        }
        1.0 - 2.0 * tail
    }
}

/// P(D_n < d), exact for n up to `KOLMOGOROV_EXACT_LIMIT`,
/// Stephens' corrected limit distribution above.
pub fn kolmogorov_cdf(n: usize, d: f64) -> f64 {
    if n == 0 || d <= 0.0 {
        return 0.0;
    }
    if d >= 1.0 {
        return 1.0;
    }
    let cdf = if n <= KOLMOGOROV_EXACT_LIMIT {
        kolmogorov_cdf_exact(n, d)
    } else {
        let root_n = (n as f64).sqrt();
        kolmogorov_limit_cdf((root_n + 0.12 + 0.11 / root_n) * d)
    };
    cdf.clamp(0.0, 1.0)
}

/// P(D_n >= d).
pub fn kolmogorov_sf(n: usize, d: f64) -> f64 {
    (1.0 - kolmogorov_cdf(n, d)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_quantiles() {
        assert!((normal_ppf(0.975).unwrap() - 1.959963984540054).abs() < 1e-9);
        assert!((normal_cdf(0.0).unwrap() - 0.5).abs() < 1e-15);
        let peak = normal_pdf(0.0, 0.0, 1.0).unwrap();
        assert!((peak - 0.3989422804014327).abs() < 1e-12);
    }

    #[test]
    fn test_chi_squared_critical_value() {
        assert!((chi_squared_ppf(3.0, 0.95).unwrap() - 7.814727903251178).abs() < 1e-3);
        let sf = chi_squared_sf(3.0, 7.814727903251178).unwrap();
        assert!((sf - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_students_t_critical_value() {
        // t(0.975, 9) = 2.2621571627409915
        assert!((students_t_ppf(9.0, 0.975).unwrap() - 2.2621571627409915).abs() < 1e-3);
        assert!((students_t_cdf(9.0, 0.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_parameter_errors() {
        assert!(matches!(chi_squared(0.0), Err(StatError::Distribution(_))));
        assert!(matches!(normal(0.0, -1.0), Err(StatError::Distribution(_))));
    }

    #[test]
    fn test_kolmogorov_single_observation() {
        // D_1 = max(u, 1 - u), P(D_1 < d) = 2d - 1 on [0.5, 1].
        assert!((kolmogorov_cdf(1, 0.75) - 0.5).abs() < 1e-12);
        assert!((kolmogorov_cdf(1, 0.6) - 0.2).abs() < 1e-12);
        assert!(kolmogorov_cdf(1, 0.4) < 1e-12);
    }

    #[test]
    fn test_kolmogorov_exact_values() {
        assert!((kolmogorov_cdf(5, 0.3) - 0.336).abs() < 1e-9);
        assert!((kolmogorov_cdf(10, 0.2) - 0.25128096).abs() < 1e-9);
        assert!((kolmogorov_sf(10, 0.1) - 0.99963712).abs() < 1e-9);
    }

    #[test]
    fn test_kolmogorov_bounds() {
        assert_eq!(kolmogorov_cdf(0, 0.5), 0.0);
        assert_eq!(kolmogorov_cdf(10, 0.0), 0.0);
        assert_eq!(kolmogorov_cdf(10, 1.0), 1.0);
        assert_eq!(kolmogorov_sf(10, 1.0), 0.0);
    }

    #[test]
    fn test_kolmogorov_limit_branches_agree() {
        // Both series describe the same function at the switch point.
        let lambda = 1.18;
        let below = kolmogorov_limit_cdf(lambda - 1e-9);
        let above = kolmogorov_limit_cdf(lambda);
        assert!((below - above).abs() < 1e-8);
        // Large n falls back to the limit distribution, P(K > 1.358) ~ 0.05.
        let d = 1.358 / ((5000f64).sqrt() + 0.12 + 0.11 / (5000f64).sqrt());
        assert!((kolmogorov_sf(5000, d) - 0.05).abs() < 1e-3);
    }
}
