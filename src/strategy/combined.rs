//! Trend + Z-Score Conjunction
//!
//! Both inputs are decisions for the same close. The single execution lag is
//! applied later by the return compounder, for every variant alike.

use crate::domain::error::BacktestResult;
use crate::domain::signal::Signal;

/// Logical AND of the trend and z-score signals; undefined if either is
pub fn combined_signal(trend_signal: &Signal, z_signal: &Signal) -> BacktestResult<Signal> {
    trend_signal.ensure_aligned(z_signal, "trend vs z-score signal")?;

    let values = trend_signal
        .values()
        .iter()
        .zip(z_signal.values())
        .map(|(trend, z)| match (trend, z) {
            (Some(t), Some(z)) => Some(*t && *z),
            _ => None,
        })
        .collect();

    Ok(trend_signal.with_values(values))
}
