//! Performance Analyzer
//!
//! Distributional statistics over the defined values of a return series:
//! - mean and sample (N-1) standard deviation
//! - adjusted Fisher-Pearson skewness (0 for a normal distribution)
//! - bias-corrected excess kurtosis (0 for a normal distribution)
//! - Sharpe ratio of the excess returns r - rf
//!
//! The bias corrections divide by (n-2)(n-3), so with fewer than
//! `MIN_ADJUSTED_OBSERVATIONS` returns the population forms g1 and g2 are
//! reported instead.
//!
//! The risk-free rate is subtracted from every observation before both the
//! mean and the standard deviation are taken. With a scalar rf this equals
//! (mean(r) - rf) / std(r).

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::domain::error::{BacktestError, BacktestResult};
use crate::domain::series::{GrowthSeries, ReturnSeries};

/// Minimum observations for the bias-corrected higher moments
pub const MIN_ADJUSTED_OBSERVATIONS: usize = 4;
/// Standard deviations at or below this are treated as zero
const MIN_STDDEV: f64 = 1e-12;

/// Summary statistics of one return series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub mean: f64,
    pub stddev: f64,
    pub skewness: f64,
    /// Excess kurtosis
    pub kurtosis: f64,
    /// Per-period Sharpe ratio
    pub sharpe: f64,
    /// Number of defined returns used
    pub observations: usize,
}

impl PerformanceSummary {
    /// Sharpe ratio scaled by sqrt(periods per year)
    pub fn annualized_sharpe(&self, periods_per_year: u32) -> f64 {
        self.sharpe * f64::from(periods_per_year).sqrt()
    }

    /// Mean return compounded over a year
    pub fn annualized_mean(&self, periods_per_year: u32) -> f64 {
        (1.0 + self.mean).powf(f64::from(periods_per_year)) - 1.0
    }
}

/// Summarize the defined values of `returns`
pub fn summarize(returns: &ReturnSeries, risk_free_rate_per_period: f64) -> BacktestResult<PerformanceSummary> {
    if !risk_free_rate_per_period.is_finite() {
        return Err(BacktestError::config(format!(
            "risk-free rate must be finite, got {}",
            risk_free_rate_per_period
        )));
    }

    let values: Vec<f64> = returns.defined().map(|(_, r)| r).collect();
    summarize_values(&values, risk_free_rate_per_period)
}

/// Summarize a plain slice of returns
pub fn summarize_values(values: &[f64], risk_free_rate_per_period: f64) -> BacktestResult<PerformanceSummary> {
    let n = values.len();
    if n < 2 {
        return Err(BacktestError::undefined(format!(
            "standard deviation needs at least 2 observations, got {}",
            n
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(BacktestError::undefined("return series contains non-finite values"));
    }

    let mean = values.iter().mean();
    let stddev = values.iter().std_dev();
    if !(stddev > MIN_STDDEV) {
        return Err(BacktestError::undefined("returns have zero standard deviation"));
    }
    let excess: Vec<f64> = values.iter().map(|r| r - risk_free_rate_per_period).collect();
    let excess_std = excess.iter().std_dev();
    if !(excess_std > MIN_STDDEV) {
        return Err(BacktestError::undefined("excess returns have zero standard deviation"));
    }
    let sharpe = excess.iter().mean() / excess_std;

    Ok(PerformanceSummary {
        mean,
        stddev,
        skewness: skewness(values, mean),
        kurtosis: excess_kurtosis(values, mean),
        sharpe,
        observations: n,
    })
}

// Central moment of order k with the 1/n normalization
fn central_moment(values: &[f64], mean: f64, k: i32) -> f64 {
    values.iter().map(|x| (x - mean).powi(k)).sum::<f64>() / values.len() as f64
}

/// Adjusted Fisher-Pearson skewness G1 = g1 * sqrt(n(n-1)) / (n-2),
/// or the population g1 below `MIN_ADJUSTED_OBSERVATIONS`
fn skewness(values: &[f64], mean: f64) -> f64 {
    let m2 = central_moment(values, mean, 2);
    let m3 = central_moment(values, mean, 3);
    let g1 = m3 / m2.powf(1.5);
    if values.len() < MIN_ADJUSTED_OBSERVATIONS {
        return g1;
    }
    let n = values.len() as f64;
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Bias-corrected excess kurtosis G2, or the population g2 below
/// `MIN_ADJUSTED_OBSERVATIONS`
fn excess_kurtosis(values: &[f64], mean: f64) -> f64 {
    let m2 = central_moment(values, mean, 2);
    let m4 = central_moment(values, mean, 4);
    let g2 = m4 / (m2 * m2) - 3.0;
    if values.len() < MIN_ADJUSTED_OBSERVATIONS {
        return g2;
    }
    let n = values.len() as f64;
    (n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0)
}

/// Largest peak-to-trough decline of a growth curve, as a positive fraction.
///
/// The implicit starting value of 1.0 counts as the first peak.
pub fn max_drawdown(growth: &GrowthSeries) -> f64 {
    let mut peak = 1.0f64;
    let mut max_dd = 0.0f64;
    for &value in growth.values() {
        peak = peak.max(value);
        max_dd = max_dd.max((peak - value) / peak);
    }
    max_dd
}

/// Total compounded return over the growth curve
pub fn total_return(growth: &GrowthSeries) -> Option<f64> {
    growth.values().last().map(|g| g - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::TimeSeries;
    use approx::assert_relative_eq;
    use chrono::{Days, NaiveDate};

    fn series<T>(values: Vec<T>) -> TimeSeries<T> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len()).map(|i| start + Days::new(i as u64)).collect();
        TimeSeries::new(dates, values).unwrap()
    }

    #[test]
    fn test_mean_and_sample_stddev() {
        let r = series(vec![None, Some(0.01), Some(0.02), Some(0.03), Some(0.04)]);
        let s = summarize(&r, 0.0).unwrap();
        assert_eq!(s.observations, 4);
        assert_relative_eq!(s.mean, 0.025, epsilon = 1e-12);
        // Sample variance of [1,2,3,4]% is 1.6667e-4
        assert_relative_eq!(s.stddev, (0.0005f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_symmetric_sample_has_zero_skew() {
        let r = series(vec![Some(-0.02), Some(-0.01), Some(0.0), Some(0.01), Some(0.02)]);
        let s = summarize(&r, 0.0).unwrap();
        assert_relative_eq!(s.skewness, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_skew_and_kurtosis_match_reference_values() {
        // Reference values from the adjusted (pandas-style) estimators
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        let s = summarize_values(&values, 0.0).unwrap();
        assert_relative_eq!(s.skewness, 1.697056, epsilon = 1e-6);
        assert_relative_eq!(s.kurtosis, 3.152, epsilon = 1e-9);
    }

    #[test]
    fn test_sharpe_subtracts_risk_free_per_observation() {
        let values = [0.01, 0.02, -0.01, 0.03, 0.00];
        let rf = 0.001;
        let s = summarize_values(&values, rf).unwrap();

        let mean = values.iter().mean();
        let std = values.iter().std_dev();
        // Scalar rf: per-observation subtraction equals the textbook shortcut
        assert_relative_eq!(s.sharpe, (mean - rf) / std, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_returns_are_statistics_error() {
        let r = series(vec![Some(0.001); 10]);
        assert!(matches!(
            summarize(&r, 0.0),
            Err(BacktestError::StatisticsUndefined(_))
        ));
    }

    #[test]
    fn test_too_few_observations() {
        let empty: TimeSeries<Option<f64>> = series(vec![]);
        assert!(matches!(summarize(&empty, 0.0), Err(BacktestError::StatisticsUndefined(_))));

        let single = series(vec![None, Some(0.01)]);
        assert!(matches!(summarize(&single, 0.0), Err(BacktestError::StatisticsUndefined(_))));
    }

    #[test]
    fn test_short_samples_use_population_moments() {
        let three = series(vec![Some(0.01), Some(0.02), Some(0.04)]);
        let s = summarize(&three, 0.0).unwrap();
        assert_eq!(s.observations, 3);
        assert!(s.skewness.is_finite() && s.kurtosis.is_finite());

        // Two distinct points: g1 = 0, m4 / m2^2 = 1 so g2 = -2
        let s = summarize_values(&[0.01, 0.03], 0.0).unwrap();
        assert_relative_eq!(s.mean, 0.02, epsilon = 1e-12);
        assert_relative_eq!(s.skewness, 0.0, epsilon = 1e-12);
        assert_relative_eq!(s.kurtosis, -2.0, epsilon = 1e-9);
        assert!(s.sharpe.is_finite());

        // [1, 2, 3]: m2 = m4 = 2/3 so g2 = 1.5 - 3
        let s = summarize_values(&[1.0, 2.0, 3.0], 0.0).unwrap();
        assert_relative_eq!(s.skewness, 0.0, epsilon = 1e-12);
        assert_relative_eq!(s.kurtosis, -1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_annualized_sharpe() {
        let values = [0.01, 0.02, -0.01, 0.03, 0.00];
        let s = summarize_values(&values, 0.0).unwrap();
        assert_relative_eq!(s.annualized_sharpe(252), s.sharpe * 252f64.sqrt());
    }

    #[test]
    fn test_max_drawdown_and_total_return() {
        let g = series(vec![1.1, 0.88, 0.99, 1.2]);
        assert_relative_eq!(max_drawdown(&g), 0.2, epsilon = 1e-12);
        assert_relative_eq!(total_return(&g).unwrap(), 0.2, epsilon = 1e-12);

        // A curve that only falls measures from the implicit 1.0 base
        let g = series(vec![0.9, 0.8]);
        assert_relative_eq!(max_drawdown(&g), 0.2, epsilon = 1e-12);
    }
}
