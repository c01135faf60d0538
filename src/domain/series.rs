//! Time Series Values
//!
//! Date-indexed series are immutable once built: every transformation in the
//! crate produces a new series instead of editing one in place.
//!
//! Dates are strictly increasing. Missing trading days are absent rows,
//! while values that cannot be computed yet (rolling warm-up, the first
//! return) are `None` inside a `TimeSeries<Option<_>>`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::{BacktestError, BacktestResult};

/// Ordered sequence of (date, value) pairs
///
/// Deserialization goes through `TimeSeries::new`, so decoded series hold the
/// same length and ordering guarantees as constructed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawTimeSeries<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct TimeSeries<T> {
    dates: Vec<NaiveDate>,
    values: Vec<T>,
}

/// Unchecked wire form of `TimeSeries`
#[derive(Deserialize)]
struct RawTimeSeries<T> {
    dates: Vec<NaiveDate>,
    values: Vec<T>,
}

impl<T> TryFrom<RawTimeSeries<T>> for TimeSeries<T> {
    type Error = BacktestError;

    fn try_from(raw: RawTimeSeries<T>) -> BacktestResult<Self> {
        TimeSeries::new(raw.dates, raw.values)
    }
}

/// Daily returns; the first observation is undefined
pub type ReturnSeries = TimeSeries<Option<f64>>;

/// Running product of (1 + r) from an implicit base of 1.0
pub type GrowthSeries = TimeSeries<f64>;

impl<T> TimeSeries<T> {
    /// Build a series from parallel date and value vectors.
    ///
    /// Fails with `Alignment` if the lengths differ or the dates are not
    /// strictly increasing.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<T>) -> BacktestResult<Self> {
        if dates.len() != values.len() {
            return Err(BacktestError::alignment(format!(
                "{} dates for {} values",
                dates.len(),
                values.len()
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(BacktestError::alignment(format!(
                "dates not strictly increasing at {} -> {}",
                w[0], w[1]
            )));
        }
        Ok(Self { dates, values })
    }

    /// Build a series from (date, value) pairs that are already ordered
    pub fn from_points(points: Vec<(NaiveDate, T)>) -> BacktestResult<Self> {
        let (dates, values) = points.into_iter().unzip();
        Self::new(dates, values)
    }

    /// Build a series from provider rows in any order.
    ///
    /// Rows are sorted by date; for duplicated dates the last row wins.
    pub fn from_unsorted(mut points: Vec<(NaiveDate, T)>) -> Self {
        let original = points.len();
        // Stable sort keeps provider order among equal dates
        points.sort_by_key(|(date, _)| *date);

        let mut dates: Vec<NaiveDate> = Vec::with_capacity(points.len());
        let mut values: Vec<T> = Vec::with_capacity(points.len());
        for (date, value) in points {
            if dates.last() == Some(&date) {
                if let Some(last) = values.last_mut() {
                    *last = value;
                }
            } else {
                dates.push(date);
                values.push(value);
            }
        }

        if dates.len() != original {
            tracing::warn!(
                "Dropped {} duplicate rows while ordering series",
                original - dates.len()
            );
        }

        Self { dates, values }
    }

    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<(NaiveDate, &T)> {
        Some((*self.dates.get(index)?, self.values.get(index)?))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &T)> + '_ {
        self.dates.iter().copied().zip(self.values.iter())
    }

    /// Apply `f` to every value, keeping the dates
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> TimeSeries<U> {
        TimeSeries {
            dates: self.dates.clone(),
            values: self.values.iter().map(f).collect(),
        }
    }

    /// Pair this series' dates with freshly computed values.
    ///
    /// Callers compute `values` index-by-index from this series.
    pub(crate) fn with_values<U>(&self, values: Vec<U>) -> TimeSeries<U> {
        debug_assert_eq!(values.len(), self.dates.len());
        TimeSeries {
            dates: self.dates.clone(),
            values,
        }
    }

    /// Check that `other` covers exactly the same dates
    pub fn ensure_aligned<U>(&self, other: &TimeSeries<U>, context: &str) -> BacktestResult<()> {
        if self.dates == other.dates {
            return Ok(());
        }
        let first_mismatch = self
            .dates
            .iter()
            .zip(other.dates.iter())
            .position(|(a, b)| a != b);
        Err(BacktestError::alignment(match first_mismatch {
            Some(i) => format!(
                "{}: date sets differ at row {} ({} vs {})",
                context, i, self.dates[i], other.dates[i]
            ),
            None => format!(
                "{}: {} rows vs {} rows",
                context,
                self.len(),
                other.len()
            ),
        }))
    }
}

impl<T: Clone> TimeSeries<T> {
    /// Restrict to the inclusive date range; `None` leaves that side open
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let (dates, values) = self
            .iter()
            .filter(|(d, _)| start.map_or(true, |s| *d >= s) && end.map_or(true, |e| *d <= e))
            .map(|(d, v)| (d, v.clone()))
            .unzip();
        Self { dates, values }
    }
}

impl<T: Copy> TimeSeries<Option<T>> {
    /// Number of rows holding a defined value
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Defined rows only, in date order
    pub fn defined(&self) -> impl Iterator<Item = (NaiveDate, T)> + '_ {
        self.iter().filter_map(|(d, v)| v.map(|v| (d, v)))
    }

    /// Index of the first defined row
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_some())
    }
}

/// One trading day of the asset close and the annualised risk-free yield
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub asset_price: f64,
    /// Annualised risk-free rate in percent (e.g. 4.5 for 4.5%)
    pub risk_free_rate_annual_pct: f64,
}

/// How to join an asset series with a risk-free series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Date sets must be identical
    #[default]
    Strict,
    /// Keep only dates present in both series
    Intersect,
}

/// Validated, date-ordered price history for one asset and its risk-free leg
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Build from individual points, sorting and deduplicating by date
    pub fn from_points(points: Vec<PricePoint>) -> BacktestResult<Self> {
        let series = TimeSeries::from_unsorted(points.into_iter().map(|p| (p.date, p)).collect());
        let points: Vec<PricePoint> = series.values().to_vec();
        for p in &points {
            Self::validate_point(p)?;
        }
        Ok(Self { points })
    }

    /// Join an asset close series with an annual-percent risk-free series
    pub fn from_series(
        asset: &TimeSeries<f64>,
        risk_free_annual_pct: &TimeSeries<f64>,
        policy: AlignmentPolicy,
    ) -> BacktestResult<Self> {
        let points: Vec<PricePoint> = match policy {
            AlignmentPolicy::Strict => {
                asset.ensure_aligned(risk_free_annual_pct, "asset vs risk-free")?;
                asset
                    .iter()
                    .zip(risk_free_annual_pct.values())
                    .map(|((date, &asset_price), &rf)| PricePoint {
                        date,
                        asset_price,
                        risk_free_rate_annual_pct: rf,
                    })
                    .collect()
            }
            AlignmentPolicy::Intersect => {
                let joined = Self::intersect(asset, risk_free_annual_pct);
                let discarded = asset.len() + risk_free_annual_pct.len() - 2 * joined.len();
                if discarded > 0 {
                    tracing::warn!(
                        "Discarded {} rows present in only one of asset/risk-free series",
                        discarded
                    );
                }
                joined
            }
        };

        for p in &points {
            Self::validate_point(p)?;
        }
        Ok(Self { points })
    }

    // Merge walk over two strictly increasing date vectors
    fn intersect(asset: &TimeSeries<f64>, rf: &TimeSeries<f64>) -> Vec<PricePoint> {
        let mut out = Vec::with_capacity(asset.len().min(rf.len()));
        let (mut i, mut j) = (0, 0);
        while i < asset.len() && j < rf.len() {
            let (da, db) = (asset.dates[i], rf.dates[j]);
            if da == db {
                out.push(PricePoint {
                    date: da,
                    asset_price: asset.values[i],
                    risk_free_rate_annual_pct: rf.values[j],
                });
                i += 1;
                j += 1;
            } else if da < db {
                i += 1;
            } else {
                j += 1;
            }
        }
        out
    }

    fn validate_point(p: &PricePoint) -> BacktestResult<()> {
        if !p.asset_price.is_finite() || p.asset_price <= 0.0 {
            return Err(BacktestError::config(format!(
                "asset price must be positive and finite, got {} on {}",
                p.asset_price, p.date
            )));
        }
        if !p.risk_free_rate_annual_pct.is_finite() || p.risk_free_rate_annual_pct <= -100.0 {
            return Err(BacktestError::config(format!(
                "risk-free rate must be finite and above -100%, got {} on {}",
                p.risk_free_rate_annual_pct, p.date
            )));
        }
        Ok(())
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn asset_prices(&self) -> TimeSeries<f64> {
        TimeSeries {
            dates: self.points.iter().map(|p| p.date).collect(),
            values: self.points.iter().map(|p| p.asset_price).collect(),
        }
    }

    pub fn risk_free_annual_pct(&self) -> TimeSeries<f64> {
        TimeSeries {
            dates: self.points.iter().map(|p| p.date).collect(),
            values: self.points.iter().map(|p| p.risk_free_rate_annual_pct).collect(),
        }
    }
}
