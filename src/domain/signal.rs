//! Binary exposure signals
//!
//! `Some(true)` means "hold the asset", `Some(false)` means "hold the
//! risk-free instrument" and `None` means the signal is not yet defined
//! (warm-up) and the row must be excluded downstream.

use crate::domain::series::TimeSeries;

/// Exposure decision per date, aligned 1:1 with the input prices
pub type Signal = TimeSeries<Option<bool>>;

/// Render a signal in the 0/1 convention used by reports
pub fn to_binary(signal: &Signal) -> TimeSeries<Option<u8>> {
    signal.map(|v| v.map(u8::from))
}

/// Fraction of defined signal days spent in the asset
pub fn exposure(signal: &Signal) -> Option<f64> {
    let defined = signal.defined_count();
    if defined == 0 {
        return None;
    }
    let long = signal.values().iter().filter(|v| **v == Some(true)).count();
    Some(long as f64 / defined as f64)
}

/// Number of times the defined signal changes state
pub fn transitions(signal: &Signal) -> usize {
    let defined: Vec<bool> = signal.defined().map(|(_, v)| v).collect();
    defined.windows(2).filter(|w| w[0] != w[1]).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn signal(values: Vec<Option<bool>>) -> Signal {
        let dates = (0..values.len())
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64))
            .collect();
        TimeSeries::new(dates, values).unwrap()
    }

    #[test]
    fn test_binary_rendering() {
        let s = signal(vec![None, Some(true), Some(false)]);
        assert_eq!(to_binary(&s).values(), &[None, Some(1), Some(0)]);
    }

    #[test]
    fn test_exposure_ignores_undefined_rows() {
        let s = signal(vec![None, None, Some(true), Some(false), Some(true), Some(true)]);
        assert_relative_eq!(exposure(&s).unwrap(), 0.75);

        let warmup_only = signal(vec![None, None]);
        assert!(exposure(&warmup_only).is_none());
    }

    #[test]
    fn test_transitions() {
        let s = signal(vec![None, Some(true), Some(true), Some(false), Some(true)]);
        assert_eq!(transitions(&s), 2);
    }
}
