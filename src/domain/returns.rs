//! Return Compounder
//!
//! Converts prices and signals into realized daily strategy returns and
//! compounds them into growth curves.
//!
//! Timing: the return realized on day t uses the signal observed at the close
//! of day t-1. Applying a signal to its own day's return would be lookahead.

use crate::domain::error::{BacktestError, BacktestResult};
use crate::domain::series::{GrowthSeries, ReturnSeries, TimeSeries};
use crate::domain::signal::Signal;

/// Simple daily returns; the first observation has no prior price
pub fn simple_returns(prices: &TimeSeries<f64>) -> ReturnSeries {
    let p = prices.values();
    let values = (0..p.len())
        .map(|t| if t == 0 { None } else { Some(p[t] / p[t - 1] - 1.0) })
        .collect();
    prices.with_values(values)
}

/// Daily risk-free returns from an annualised percent yield.
///
/// r = (1 + pct / 100)^(1 / periods_per_year) - 1
pub fn daily_risk_free_returns(
    annual_pct: &TimeSeries<f64>,
    periods_per_year: u32,
) -> BacktestResult<ReturnSeries> {
    if periods_per_year == 0 {
        return Err(BacktestError::config("periods_per_year must be positive"));
    }
    let exponent = 1.0 / f64::from(periods_per_year);
    Ok(annual_pct.map(|pct| Some(annual_to_periodic(pct / 100.0, exponent))))
}

/// Annual decimal rate to a per-period rate
pub fn annual_to_periodic(annual_rate: f64, exponent: f64) -> f64 {
    (1.0 + annual_rate).powf(exponent) - 1.0
}

/// Realized returns of a signal-driven strategy.
///
/// Day t earns `asset_returns[t]` when `signal[t-1]` is long, and
/// `risk_free_returns[t]` when it is flat. Day 0 and any day whose lagged
/// signal is undefined stay undefined.
pub fn strategy_returns(
    signal: &Signal,
    asset_returns: &ReturnSeries,
    risk_free_returns: &ReturnSeries,
) -> BacktestResult<ReturnSeries> {
    signal.ensure_aligned(asset_returns, "signal vs asset returns")?;
    asset_returns.ensure_aligned(risk_free_returns, "asset vs risk-free returns")?;

    let s = signal.values();
    let a = asset_returns.values();
    let rf = risk_free_returns.values();

    let values = (0..s.len())
        .map(|t| {
            if t == 0 {
                return None;
            }
            if s[t - 1]? {
                a[t]
            } else {
                rf[t]
            }
        })
        .collect();

    Ok(asset_returns.with_values(values))
}

/// Fixed-weight benchmark: w * asset + (1 - w) * risk-free, every day
pub fn buy_and_hold_returns(
    asset_returns: &ReturnSeries,
    risk_free_returns: &ReturnSeries,
    asset_weight: f64,
) -> BacktestResult<ReturnSeries> {
    validate_weight(asset_weight)?;
    asset_returns.ensure_aligned(risk_free_returns, "asset vs risk-free returns")?;

    let values = asset_returns
        .values()
        .iter()
        .zip(risk_free_returns.values())
        .map(|(a, rf)| match (a, rf) {
            (Some(a), Some(rf)) => Some(asset_weight * a + (1.0 - asset_weight) * rf),
            _ => None,
        })
        .collect();

    Ok(asset_returns.with_values(values))
}

/// Asset weight must lie in (0, 1]
pub fn validate_weight(weight: f64) -> BacktestResult<()> {
    if !weight.is_finite() || weight <= 0.0 || weight > 1.0 {
        return Err(BacktestError::config(format!(
            "asset weight must be in (0, 1], got {}",
            weight
        )));
    }
    Ok(())
}

/// Running product of (1 + r) from an implicit base of 1.0.
///
/// Rows with an undefined return are dropped from the output instead of
/// being compounded; the product carries over them unchanged. Fails with
/// `InsufficientData` when no defined return remains.
pub fn compound_growth(returns: &ReturnSeries) -> BacktestResult<GrowthSeries> {
    let mut growth = 1.0;
    let mut dates = Vec::with_capacity(returns.len());
    let mut values = Vec::with_capacity(returns.len());

    for (date, r) in returns.defined() {
        growth *= 1.0 + r;
        dates.push(date);
        values.push(growth);
    }

    let dropped = returns.len() - values.len();
    if values.is_empty() {
        return Err(BacktestError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    if dropped > 0 {
        tracing::debug!(dropped, kept = values.len(), "Dropped undefined returns before compounding");
    }

    TimeSeries::new(dates, values)
}
