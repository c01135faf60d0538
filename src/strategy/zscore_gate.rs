//! Z-Score Gate
//!
//! Statistical filter on the spread between price and its slow SMA.
//!
//! Z-Score Formula: z = (spread - mean(spread)) / std(spread)
//! with spread = price - slow_sma.
//!
//! The gate suppresses exposure (emits `false`) when the z-scores of the
//! previous `lookback` days were ALL strictly below the threshold.

use statrs::statistics::Statistics;

use crate::domain::error::{BacktestError, BacktestResult};
use crate::domain::series::TimeSeries;
use crate::domain::signal::Signal;
use crate::strategy::params::{ZScoreFilterConfig, ZScoreNormalization};
use crate::strategy::rolling::RollingWindow;

/// Spread and z-score series computed by the gate
#[derive(Debug, Clone, PartialEq)]
pub struct ZScoreSeries {
    pub spread: TimeSeries<Option<f64>>,
    pub z_score: TimeSeries<Option<f64>>,
}

/// Z-score gate for the crossover strategy
#[derive(Debug, Clone, Copy)]
pub struct ZScoreGate {
    config: ZScoreFilterConfig,
}

impl ZScoreGate {
    pub fn new(config: ZScoreFilterConfig) -> BacktestResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ZScoreFilterConfig {
        &self.config
    }

    /// Compute the price/SMA spread and its z-score
    pub fn z_scores(
        &self,
        price: &TimeSeries<f64>,
        slow_sma: &TimeSeries<Option<f64>>,
    ) -> BacktestResult<ZScoreSeries> {
        price.ensure_aligned(slow_sma, "price vs slow SMA")?;

        let spread_values = price
            .values()
            .iter()
            .zip(slow_sma.values())
            .map(|(p, sma)| sma.map(|s| p - s))
            .collect();
        let spread = price.with_values(spread_values);

        let z_score = match self.config.normalization {
            ZScoreNormalization::FullSample => Self::full_sample(&spread)?,
            ZScoreNormalization::Trailing { window } => Self::trailing(&spread, window)?,
        };

        Ok(ZScoreSeries { spread, z_score })
    }

    // One mean/std over every defined spread value
    fn full_sample(spread: &TimeSeries<Option<f64>>) -> BacktestResult<TimeSeries<Option<f64>>> {
        let defined: Vec<f64> = spread.defined().map(|(_, v)| v).collect();
        if defined.len() < 2 {
            return Err(BacktestError::undefined(format!(
                "spread standard deviation needs at least 2 values, got {}",
                defined.len()
            )));
        }

        let mean = defined.iter().mean();
        let std_dev = defined.iter().std_dev();
        if !(std_dev > 1e-10) {
            return Err(BacktestError::undefined("spread has zero standard deviation"));
        }

        tracing::debug!(mean, std_dev, samples = defined.len(), "Full-sample spread statistics");
        Ok(spread.map(|v| v.map(|s| (s - mean) / std_dev)))
    }

    // Trailing mean/std, so z[i] only uses spread[..=i]
    fn trailing(
        spread: &TimeSeries<Option<f64>>,
        window: usize,
    ) -> BacktestResult<TimeSeries<Option<f64>>> {
        let roller = RollingWindow::trailing(window)?;
        let mean = roller.mean_of_defined(spread)?;
        let std_dev = roller.std_dev_of_defined(spread)?;

        let values = spread
            .values()
            .iter()
            .zip(mean.values().iter().zip(std_dev.values()))
            .map(|(s, (m, sd))| match (s, m, sd) {
                (Some(s), Some(m), Some(sd)) if *sd > 1e-10 => Some((s - m) / sd),
                _ => None,
            })
            .collect();
        Ok(spread.with_values(values))
    }

    /// Gate signal from precomputed z-scores.
    ///
    /// Value at i is `None` until z[i-lookback..i] are all defined.
    pub fn signal_from_z(&self, z_score: &TimeSeries<Option<f64>>) -> Signal {
        let lookback = self.config.lookback;
        let threshold = self.config.threshold;
        let z = z_score.values();

        let values = (0..z.len())
            .map(|i| {
                if i < lookback {
                    return None;
                }
                let prior = &z[i - lookback..i];
                if prior.iter().any(Option::is_none) {
                    return None;
                }
                let all_below = prior.iter().flatten().all(|&v| v < threshold);
                Some(!all_below)
            })
            .collect();

        z_score.with_values(values)
    }

    /// Z-score filter signal straight from prices and the slow SMA
    pub fn signal(
        &self,
        price: &TimeSeries<f64>,
        slow_sma: &TimeSeries<Option<f64>>,
    ) -> BacktestResult<Signal> {
        let z = self.z_scores(price, slow_sma)?;
        Ok(self.signal_from_z(&z.z_score))
    }
}

/// Z-score filter signal with explicit parameters
pub fn zscore_filter_signal(
    price: &TimeSeries<f64>,
    slow_sma: &TimeSeries<Option<f64>>,
    config: ZScoreFilterConfig,
) -> BacktestResult<Signal> {
    ZScoreGate::new(config)?.signal(price, slow_sma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Days, NaiveDate};

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + Days::new(i as u64)).collect()
    }

    fn create_test_gate() -> ZScoreGate {
        ZScoreGate::new(ZScoreFilterConfig::default()).unwrap()
    }

    #[test]
    fn test_full_sample_zscores_are_standardized() {
        let price = TimeSeries::new(dates(5), vec![10.0, 12.0, 14.0, 16.0, 18.0]).unwrap();
        let sma = TimeSeries::new(dates(5), vec![None, Some(11.0), Some(12.0), Some(13.0), Some(14.0)]).unwrap();

        let z = create_test_gate().z_scores(&price, &sma).unwrap();
        assert_eq!(z.spread.values(), &[None, Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);

        let defined: Vec<f64> = z.z_score.defined().map(|(_, v)| v).collect();
        assert_eq!(defined.len(), 4);
        assert_relative_eq!(defined.iter().mean(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(defined.iter().std_dev(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_signal_suppresses_after_three_low_days() {
        let z = TimeSeries::new(
            dates(7),
            vec![Some(-1.0), Some(-1.0), Some(-1.0), Some(0.5), Some(-1.0), Some(-1.0), Some(-1.0)],
        )
        .unwrap();
        let signal = create_test_gate().signal_from_z(&z);

        // Indices 0..3 lack three prior values
        assert_eq!(signal.values()[..3], [None::<bool>; 3]);
        // z[0..3] all below -0.05 -> suppress
        assert_eq!(signal.values()[3], Some(false));
        // z[1..4] includes 0.5 -> allow
        assert_eq!(signal.values()[4], Some(true));
        assert_eq!(signal.values()[5], Some(true));
        assert_eq!(signal.values()[6], Some(true));
    }

    #[test]
    fn test_threshold_is_strict() {
        let z = TimeSeries::new(dates(4), vec![Some(-0.05), Some(-1.0), Some(-1.0), None]).unwrap();
        let signal = create_test_gate().signal_from_z(&z);
        // -0.05 is not strictly below -0.05
        assert_eq!(signal.values()[3], Some(true));
    }

    #[test]
    fn test_undefined_zscores_give_undefined_signal() {
        let z = TimeSeries::new(dates(5), vec![None, Some(-1.0), Some(-1.0), Some(-1.0), Some(-1.0)]).unwrap();
        let signal = create_test_gate().signal_from_z(&z);
        assert_eq!(signal.values()[3], None);
        assert_eq!(signal.values()[4], Some(false));
    }

    #[test]
    fn test_constant_spread_is_statistics_error() {
        let price = TimeSeries::new(dates(4), vec![10.0, 10.0, 10.0, 10.0]).unwrap();
        let sma = TimeSeries::new(dates(4), vec![Some(9.0); 4]).unwrap();
        assert!(matches!(
            create_test_gate().z_scores(&price, &sma),
            Err(BacktestError::StatisticsUndefined(_))
        ));
    }

    #[test]
    fn test_trailing_normalization_is_causal() {
        let config = ZScoreFilterConfig {
            normalization: ZScoreNormalization::Trailing { window: 3 },
            ..Default::default()
        };
        let gate = ZScoreGate::new(config).unwrap();

        let sma = TimeSeries::new(dates(8), vec![Some(0.0); 8]).unwrap();
        let a = TimeSeries::new(dates(8), vec![1.0, 2.0, 4.0, 3.0, 5.0, 2.0, 8.0, 1.0]).unwrap();
        let b = TimeSeries::new(dates(8), vec![1.0, 2.0, 4.0, 3.0, 5.0, -20.0, 80.0, -7.0]).unwrap();

        let za = gate.z_scores(&a, &sma).unwrap().z_score;
        let zb = gate.z_scores(&b, &sma).unwrap().z_score;
        assert_eq!(za.values()[..5], zb.values()[..5]);
        assert_eq!(za.values()[0], None);
        assert_eq!(za.values()[1], None);
        assert!(za.values()[2].is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ZScoreFilterConfig { lookback: 0, ..Default::default() };
        assert!(matches!(ZScoreGate::new(config), Err(BacktestError::Configuration(_))));
    }
}
