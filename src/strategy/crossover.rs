//! SMA Crossover Signal
//!
//! Long the asset while the fast SMA is strictly above the slow SMA.
//! Equal averages are treated as "not bullish".

use crate::domain::error::BacktestResult;
use crate::domain::series::TimeSeries;
use crate::domain::signal::Signal;

/// Value at i is `Some(fast[i] > slow[i])` when both averages are defined
pub fn sma_crossover_signal(
    fast_sma: &TimeSeries<Option<f64>>,
    slow_sma: &TimeSeries<Option<f64>>,
) -> BacktestResult<Signal> {
    fast_sma.ensure_aligned(slow_sma, "fast vs slow SMA")?;

    let values = fast_sma
        .values()
        .iter()
        .zip(slow_sma.values())
        .map(|(fast, slow)| match (fast, slow) {
            (Some(f), Some(s)) => Some(f > s),
            _ => None,
        })
        .collect();

    Ok(fast_sma.with_values(values))
}

/// Dates where the crossover turns bullish (golden cross) or bearish (death cross)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossEvent {
    Golden,
    Death,
}

/// Cross events keyed by the date on which the new state is first observed
pub fn cross_events(signal: &Signal) -> Vec<(chrono::NaiveDate, CrossEvent)> {
    let mut events = Vec::new();
    let mut previous: Option<bool> = None;
    for (date, value) in signal.defined() {
        match (previous, value) {
            (Some(false), true) => events.push((date, CrossEvent::Golden)),
            (Some(true), false) => events.push((date, CrossEvent::Death)),
            _ => {}
        }
        previous = Some(value);
    }
    events
}
