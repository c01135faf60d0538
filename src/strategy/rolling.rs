//! Rolling Statistics Engine
//!
//! Trailing windowed mean and sample standard deviation over a date series.
//!
//! For index i < window - 1 (and for any window that touches an undefined
//! input) the output is `None`. Undefined rows are never filled with zero.

use statrs::statistics::Statistics;

use crate::domain::error::{BacktestError, BacktestResult};
use crate::domain::series::TimeSeries;
use crate::strategy::params::{RollingWindowConfig, WindowAlignment};

/// Trailing window calculator
#[derive(Debug, Clone, Copy)]
pub struct RollingWindow {
    config: RollingWindowConfig,
}

impl RollingWindow {
    pub fn new(config: RollingWindowConfig) -> BacktestResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn trailing(window_length: usize) -> BacktestResult<Self> {
        Self::new(RollingWindowConfig::trailing(window_length))
    }

    pub fn window_length(&self) -> usize {
        self.config.window_length
    }

    /// Rolling arithmetic mean
    pub fn mean(&self, series: &TimeSeries<f64>) -> BacktestResult<TimeSeries<Option<f64>>> {
        self.mean_of_defined(&series.map(|v| Some(*v)))
    }

    /// Rolling sample (N-1) standard deviation
    pub fn std_dev(&self, series: &TimeSeries<f64>) -> BacktestResult<TimeSeries<Option<f64>>> {
        self.std_dev_of_defined(&series.map(|v| Some(*v)))
    }

    /// Rolling mean over a series that may hold undefined rows
    pub fn mean_of_defined(
        &self,
        series: &TimeSeries<Option<f64>>,
    ) -> BacktestResult<TimeSeries<Option<f64>>> {
        let values = self.apply(series.values(), |window| window.iter().mean())?;
        Ok(series.with_values(values))
    }

    /// Rolling sample standard deviation over a series that may hold undefined rows
    pub fn std_dev_of_defined(
        &self,
        series: &TimeSeries<Option<f64>>,
    ) -> BacktestResult<TimeSeries<Option<f64>>> {
        if self.config.window_length < 2 {
            return Err(BacktestError::config(
                "standard deviation needs a window of at least 2",
            ));
        }
        let values = self.apply(series.values(), |window| window.iter().std_dev())?;
        Ok(series.with_values(values))
    }

    fn apply(
        &self,
        values: &[Option<f64>],
        stat: impl Fn(&[f64]) -> f64,
    ) -> BacktestResult<Vec<Option<f64>>> {
        let window = self.config.window_length;
        if window > values.len() {
            return Err(BacktestError::InsufficientData {
                required: window,
                available: values.len(),
            });
        }

        let mut out = Vec::with_capacity(values.len());
        let mut buf: Vec<f64> = Vec::with_capacity(window);
        for i in 0..values.len() {
            let value = match self.config.alignment {
                WindowAlignment::Trailing if i + 1 < window => None,
                WindowAlignment::Trailing => {
                    buf.clear();
                    buf.extend(values[i + 1 - window..=i].iter().map_while(|v| *v));
                    (buf.len() == window).then(|| stat(&buf))
                }
            };
            out.push(value);
        }

        tracing::debug!(
            window,
            rows = values.len(),
            defined = out.iter().filter(|v| v.is_some()).count(),
            "Rolling window computed"
        );
        Ok(out)
    }
}

/// Trailing rolling mean with a window of `window` observations
pub fn rolling_mean(series: &TimeSeries<f64>, window: usize) -> BacktestResult<TimeSeries<Option<f64>>> {
    RollingWindow::trailing(window)?.mean(series)
}

/// Trailing rolling sample standard deviation with a window of `window` observations
pub fn rolling_stddev(series: &TimeSeries<f64>, window: usize) -> BacktestResult<TimeSeries<Option<f64>>> {
    RollingWindow::trailing(window)?.std_dev(series)
}
