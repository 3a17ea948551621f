//! Time Series Forecasting Module
//!
//! Monthly series and the forecasting strategies that run over them:
//!
//! - Linear Trend (OLS on a zero-based index, constant-width 95% band)
//! - Simple Moving Average (flat continuation of the trailing mean)
//! - Exponential Smoothing (flat continuation of a recency-weighted mean)
//! - Ensemble (per-step mean of whichever strategies succeed)
//!
//! Every strategy implements [`Forecaster`] and reports short input as a
//! [`ForecastOutcome::InsufficientData`] value rather than an error.

pub mod ensemble;
pub mod forecasting;
pub mod trend;

pub use ensemble::{ensemble_forecast, forecast_with_config, EnsembleForecaster};
pub use forecasting::{
    ExponentialSmoothingForecaster, ForecastOutcome, ForecastResult, Forecaster,
    LinearTrendForecaster, SimpleMovingAverageForecaster,
};
pub use trend::{analyze_trend, TrendAnalysis, TrendDirection, TrendOutcome};

use crate::error::{Error, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

/// A single monthly observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePoint {
    /// First day of the month the value belongs to
    pub period: NaiveDate,
    pub value: f64,
}

/// Ordered monthly series, strictly increasing in period
///
/// Gaps between months are allowed; they just mean fewer points to fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    periods: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from `(date, value)` pairs
    ///
    /// Dates are normalised to the first of their month. Two observations in
    /// the same month, out-of-order months, or non-finite values are rejected.
    pub fn new<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut periods: Vec<NaiveDate> = Vec::new();
        let mut values = Vec::new();

        for (date, value) in points {
            let period = month_start(date)?;
            if !value.is_finite() {
                return Err(Error::InvalidValue(format!(
                    "non-finite value {} for period {}",
                    value, period
                )));
            }
            if let Some(last) = periods.last() {
                if period <= *last {
                    return Err(Error::InvalidInput(format!(
                        "periods must be strictly increasing: {} follows {}",
                        period, last
                    )));
                }
            }
            periods.push(period);
            values.push(value);
        }

        Ok(TimeSeries { periods, values })
    }

    /// Consecutive monthly values starting at `start`'s month
    pub fn from_monthly_values(start: NaiveDate, values: &[f64]) -> Result<Self> {
        let start = month_start(start)?;
        let mut points = Vec::with_capacity(values.len());
        for (i, &value) in values.iter().enumerate() {
            let period = start
                .checked_add_months(Months::new(i as u32))
                .ok_or_else(|| Error::InvalidInput(format!("period overflow after {}", start)))?;
            points.push((period, value));
        }
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    pub fn points(&self) -> impl Iterator<Item = TimePoint> + '_ {
        self.periods
            .iter()
            .zip(self.values.iter())
            .map(|(&period, &value)| TimePoint { period, value })
    }

    pub fn last_period(&self) -> Option<NaiveDate> {
        self.periods.last().copied()
    }

    /// The `horizon` month starts following the last observation
    pub fn future_periods(&self, horizon: usize) -> Vec<NaiveDate> {
        match self.last_period() {
            Some(last) => (1..=horizon)
                .filter_map(|k| last.checked_add_months(Months::new(k as u32)))
                .collect(),
            None => Vec::new(),
        }
    }
}

fn month_start(date: NaiveDate) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .ok_or_else(|| Error::InvalidInput(format!("invalid period {}", date)))
}
