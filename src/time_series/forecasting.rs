//! Forecasting strategies
//!
//! Each strategy is a small value implementing [`Forecaster`]. A strategy
//! whose minimum-sample precondition is unmet returns
//! [`ForecastOutcome::InsufficientData`]; only caller contract violations
//! (a zero horizon, invalid parameters) surface as `Err`.

use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::ml::metrics::regression::r2_score;
use crate::time_series::TimeSeries;
use chrono::NaiveDate;
use serde::Serialize;

/// Point forecast for a number of future periods
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Machine name of the producing strategy (`linear`, `moving_average`, ...)
    pub method: String,
    /// Human-readable model label
    pub model_type: String,
    /// One value per future period; always `horizon` long
    pub forecast: Vec<f64>,
    pub lower_bound: Option<Vec<f64>>,
    pub upper_bound: Option<Vec<f64>>,
    /// In-sample fit quality (linear regression only)
    pub r_squared: Option<f64>,
    /// Future month starts, filled in by [`Forecaster::forecast_series`]
    pub periods: Vec<NaiveDate>,
    /// Strategies averaged into this result (ensemble only)
    pub methods_used: Vec<String>,
    /// Results of the averaged strategies, in `methods_used` order (ensemble only)
    pub components: Vec<ForecastResult>,
}

impl ForecastResult {
    pub(crate) fn new(method: &str, model_type: String, forecast: Vec<f64>) -> Self {
        ForecastResult {
            method: method.to_string(),
            model_type,
            forecast,
            lower_bound: None,
            upper_bound: None,
            r_squared: None,
            periods: Vec::new(),
            methods_used: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }

    /// The forecast scaled by `1 + adjustment_pct / 100`
    ///
    /// Used for optimistic (+) and pessimistic (-) scenario lines.
    pub fn scenario(&self, adjustment_pct: f64) -> Vec<f64> {
        let factor = 1.0 + adjustment_pct / 100.0;
        self.forecast.iter().map(|v| v * factor).collect()
    }
}

/// Tagged outcome of a forecasting strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Success(ForecastResult),
    InsufficientData {
        method: String,
        required: usize,
        available: usize,
    },
}

impl ForecastOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ForecastOutcome::Success(_))
    }

    pub fn result(&self) -> Option<&ForecastResult> {
        match self {
            ForecastOutcome::Success(result) => Some(result),
            ForecastOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<ForecastResult> {
        match self {
            ForecastOutcome::Success(result) => Some(result),
            ForecastOutcome::InsufficientData { .. } => None,
        }
    }

    /// User-facing reason when no forecast was produced
    pub fn error_message(&self) -> Option<String> {
        match self {
            ForecastOutcome::Success(_) => None,
            ForecastOutcome::InsufficientData {
                method,
                required,
                available,
            } => Some(format!(
                "Insufficient data for forecasting: {} needs at least {} observations, got {}",
                method, required, available
            )),
        }
    }

    fn insufficient(method: &str, required: usize, available: usize) -> Self {
        ForecastOutcome::InsufficientData {
            method: method.to_string(),
            required,
            available,
        }
    }
}

/// A forecasting strategy over chronologically ordered values
pub trait Forecaster {
    /// Machine name, reported in `methods_used`
    fn name(&self) -> &str;

    /// Smallest series length the strategy accepts
    fn min_observations(&self) -> usize;

    /// Forecast `horizon` periods past the end of `values`
    fn forecast(&self, values: &[f64], horizon: usize) -> Result<ForecastOutcome>;

    /// Forecast a dated series, labelling the result with future month starts
    fn forecast_series(&self, series: &TimeSeries, horizon: usize) -> Result<ForecastOutcome> {
        let outcome = self.forecast(series.values(), horizon)?;
        Ok(match outcome {
            ForecastOutcome::Success(mut result) => {
                result.periods = series.future_periods(horizon);
                ForecastOutcome::Success(result)
            }
            other => other,
        })
    }
}

pub(crate) fn check_horizon(horizon: usize) -> Result<()> {
    if horizon == 0 {
        return Err(Error::InvalidInput(
            "forecast horizon must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Ordinary least squares fit of value against a zero-based index
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Population standard deviation of the in-sample residuals
    pub residual_std: f64,
    pub r_squared: f64,
}

impl LinearFit {
    pub(crate) fn fit(values: &[f64]) -> Result<Self> {
        let n = values.len();
        if n < 2 {
            return Err(Error::InsufficientData(
                "a linear fit needs at least two points".into(),
            ));
        }

        let nf = n as f64;
        let x_mean = (nf - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / nf;

        let (sxy, sxx) = values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sxy, sxx), (i, &y)| {
                let dx = i as f64 - x_mean;
                (sxy + dx * (y - y_mean), sxx + dx * dx)
            });

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let fitted: Vec<f64> = (0..n).map(|i| intercept + slope * i as f64).collect();
        let residual_var = values
            .iter()
            .zip(fitted.iter())
            .map(|(y, f)| (y - f).powi(2))
            .sum::<f64>()
            / nf;
        let r_squared = r2_score(values, &fitted)?;

        Ok(LinearFit {
            slope,
            intercept,
            residual_std: residual_var.sqrt(),
            r_squared,
        })
    }

    pub(crate) fn predict(&self, index: usize) -> f64 {
        self.intercept + self.slope * index as f64
    }
}

/// Linear-trend extrapolation with a constant-width confidence band
///
/// The band is `forecast ± z · σ_residual` at every step. It does not widen
/// with distance from the last observation, so it understates uncertainty at
/// longer horizons.
#[derive(Debug, Clone)]
pub struct LinearTrendForecaster {
    confidence_z: f64,
}

impl LinearTrendForecaster {
    pub const NAME: &'static str = "linear";
    pub const MIN_OBSERVATIONS: usize = 3;

    pub fn new() -> Self {
        LinearTrendForecaster { confidence_z: 1.96 }
    }

    /// Use `z` standard deviations for the band instead of 1.96
    pub fn with_confidence_z(z: f64) -> Result<Self> {
        if !(z.is_finite() && z > 0.0) {
            return Err(Error::InvalidValue(format!(
                "confidence multiplier must be positive, got {}",
                z
            )));
        }
        Ok(LinearTrendForecaster { confidence_z: z })
    }
}

impl Default for LinearTrendForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for LinearTrendForecaster {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_observations(&self) -> usize {
        Self::MIN_OBSERVATIONS
    }

    fn forecast(&self, values: &[f64], horizon: usize) -> Result<ForecastOutcome> {
        check_horizon(horizon)?;
        let n = values.len();
        if n < Self::MIN_OBSERVATIONS {
            return Ok(ForecastOutcome::insufficient(
                Self::NAME,
                Self::MIN_OBSERVATIONS,
                n,
            ));
        }

        let fit = LinearFit::fit(values)?;
        let forecast: Vec<f64> = (n..n + horizon).map(|i| fit.predict(i)).collect();
        let half_width = self.confidence_z * fit.residual_std;

        let mut result =
            ForecastResult::new(Self::NAME, "Linear Regression".to_string(), forecast);
        result.lower_bound = Some(result.forecast.iter().map(|v| v - half_width).collect());
        result.upper_bound = Some(result.forecast.iter().map(|v| v + half_width).collect());
        result.r_squared = Some(fit.r_squared);

        Ok(ForecastOutcome::Success(result))
    }
}

/// Flat continuation of the trailing simple moving average
#[derive(Debug, Clone)]
pub struct SimpleMovingAverageForecaster {
    window: usize,
    adaptive: bool,
}

impl SimpleMovingAverageForecaster {
    pub const NAME: &'static str = "moving_average";

    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(Error::InvalidValue(
                "moving average window must be at least 1".into(),
            ));
        }
        Ok(SimpleMovingAverageForecaster {
            window,
            adaptive: false,
        })
    }

    /// Shrink the window to the series length instead of failing on short series
    pub fn adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for SimpleMovingAverageForecaster {
    fn default() -> Self {
        SimpleMovingAverageForecaster {
            window: 3,
            adaptive: false,
        }
    }
}

impl Forecaster for SimpleMovingAverageForecaster {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_observations(&self) -> usize {
        if self.adaptive {
            1
        } else {
            self.window
        }
    }

    fn forecast(&self, values: &[f64], horizon: usize) -> Result<ForecastOutcome> {
        check_horizon(horizon)?;
        let n = values.len();
        if n < self.min_observations() {
            return Ok(ForecastOutcome::insufficient(
                Self::NAME,
                self.min_observations(),
                n,
            ));
        }

        let window = self.window.min(n);
        let tail = &values[n - window..];
        let last_average = tail.iter().sum::<f64>() / window as f64;

        Ok(ForecastOutcome::Success(ForecastResult::new(
            Self::NAME,
            format!("Moving Average (window={})", window),
            vec![last_average; horizon],
        )))
    }
}

/// Flat continuation of a geometrically weighted mean of recent values
///
/// The i-th most recent of the last `min(span, n)` observations gets weight
/// `α(1−α)^i`, renormalised so the weights sum to one.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothingForecaster {
    alpha: f64,
    span: usize,
}

impl ExponentialSmoothingForecaster {
    pub const NAME: &'static str = "exponential_smoothing";
    pub const MIN_OBSERVATIONS: usize = 3;

    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::InvalidValue(format!(
                "smoothing parameter must be in (0, 1], got {}",
                alpha
            )));
        }
        Ok(ExponentialSmoothingForecaster { alpha, span: 10 })
    }

    /// Weigh at most `span` recent observations (default 10)
    pub fn with_span(mut self, span: usize) -> Result<Self> {
        if span == 0 {
            return Err(Error::InvalidValue("smoothing span must be at least 1".into()));
        }
        self.span = span;
        Ok(self)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Normalised weights, most recent observation first
    fn weights(&self, count: usize) -> Vec<f64> {
        let raw: Vec<f64> = (0..count)
            .map(|i| self.alpha * (1.0 - self.alpha).powi(i as i32))
            .collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / total).collect()
    }
}

impl Default for ExponentialSmoothingForecaster {
    fn default() -> Self {
        ExponentialSmoothingForecaster {
            alpha: 0.3,
            span: 10,
        }
    }
}

impl Forecaster for ExponentialSmoothingForecaster {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_observations(&self) -> usize {
        Self::MIN_OBSERVATIONS
    }

    fn forecast(&self, values: &[f64], horizon: usize) -> Result<ForecastOutcome> {
        check_horizon(horizon)?;
        let n = values.len();
        if n < Self::MIN_OBSERVATIONS {
            return Ok(ForecastOutcome::insufficient(
                Self::NAME,
                Self::MIN_OBSERVATIONS,
                n,
            ));
        }

        let count = self.span.min(n);
        let smoothed: f64 = self
            .weights(count)
            .iter()
            .zip(values.iter().rev())
            .map(|(w, v)| w * v)
            .sum();

        Ok(ForecastOutcome::Success(ForecastResult::new(
            Self::NAME,
            format!("Exponential Smoothing (alpha={})", self.alpha),
            vec![smoothed; horizon],
        )))
    }
}

/// Build the three standard strategies from a parameter set
pub(crate) fn standard_strategies(
    config: &ForecastConfig,
) -> Result<(
    LinearTrendForecaster,
    SimpleMovingAverageForecaster,
    ExponentialSmoothingForecaster,
)> {
    config.validate()?;
    Ok((
        LinearTrendForecaster::with_confidence_z(config.confidence_z)?,
        SimpleMovingAverageForecaster::new(config.ma_window)?,
        ExponentialSmoothingForecaster::new(config.alpha)?.with_span(config.smoothing_span)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERIES: [f64; 6] = [100.0, 110.0, 105.0, 120.0, 130.0, 125.0];

    fn success(outcome: ForecastOutcome) -> ForecastResult {
        outcome.into_result().expect("expected a forecast")
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let fit = LinearFit::fit(&[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!(fit.residual_std.abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_forecast_scenario_series() {
        let result = success(LinearTrendForecaster::new().forecast(&SERIES, 3).unwrap());
        // slope = 40/7, intercept = 705/7
        assert_eq!(result.forecast.len(), 3);
        assert!((result.forecast[0] - 135.0).abs() < 1e-9);
        assert!((result.forecast[2] - 146.42857142857142).abs() < 1e-9);
        assert!(result.forecast[1] > result.forecast[0]);
        assert!(result.forecast[2] > result.forecast[1]);
        assert_eq!(result.model_type, "Linear Regression");

        let lower = result.lower_bound.as_ref().unwrap();
        let upper = result.upper_bound.as_ref().unwrap();
        let widths: Vec<f64> = upper.iter().zip(lower).map(|(u, l)| u - l).collect();
        assert!(widths.iter().all(|w| (w - widths[0]).abs() < 1e-9));
        assert!(widths[0] > 0.0);

        let r2 = result.r_squared.unwrap();
        assert!((r2 - 0.8163265306122449).abs() < 1e-9);
    }

    #[test]
    fn test_linear_band_uses_population_residual_std() {
        let result = success(LinearTrendForecaster::new().forecast(&SERIES, 1).unwrap());
        let half_width = result.upper_bound.unwrap()[0] - result.forecast[0];
        // residuals of the OLS line through SERIES, ddof = 0
        let fit = LinearFit::fit(&SERIES).unwrap();
        assert!((half_width - 1.96 * fit.residual_std).abs() < 1e-9);
        assert!((fit.residual_std - 4.6291004988627575).abs() < 1e-9);
    }

    #[test]
    fn test_moving_average_flat() {
        let result = success(
            SimpleMovingAverageForecaster::default()
                .forecast(&SERIES, 3)
                .unwrap(),
        );
        assert_eq!(result.forecast, vec![125.0, 125.0, 125.0]);
        assert_eq!(result.model_type, "Moving Average (window=3)");
        assert!(result.lower_bound.is_none());
    }

    #[test]
    fn test_moving_average_window_checks() {
        assert!(SimpleMovingAverageForecaster::new(0).is_err());

        let strict = SimpleMovingAverageForecaster::new(5).unwrap();
        let outcome = strict.forecast(&[1.0, 2.0, 3.0], 2).unwrap();
        assert_eq!(
            outcome,
            ForecastOutcome::InsufficientData {
                method: "moving_average".to_string(),
                required: 5,
                available: 3,
            }
        );

        let adaptive = SimpleMovingAverageForecaster::new(5).unwrap().adaptive(true);
        let result = success(adaptive.forecast(&[1.0, 2.0, 3.0], 2).unwrap());
        assert_eq!(result.forecast, vec![2.0, 2.0]);
        assert_eq!(result.model_type, "Moving Average (window=3)");
    }

    #[test]
    fn test_exponential_smoothing_weights_recent_values() {
        let es = ExponentialSmoothingForecaster::default();
        let weights = es.weights(3);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(weights[0] > weights[1] && weights[1] > weights[2]);

        let result = success(es.forecast(&[10.0, 20.0, 30.0], 2).unwrap());
        // raw weights 0.3, 0.21, 0.147 applied to 30, 20, 10
        let expected = (0.3 * 30.0 + 0.21 * 20.0 + 0.147 * 10.0) / 0.657;
        assert!((result.forecast[0] - expected).abs() < 1e-9);
        assert_eq!(result.forecast[0], result.forecast[1]);
        assert_eq!(result.model_type, "Exponential Smoothing (alpha=0.3)");
    }

    #[test]
    fn test_exponential_smoothing_uses_span() {
        let values: Vec<f64> = (0..15).map(|i| i as f64).collect();
        let es = ExponentialSmoothingForecaster::new(1.0).unwrap();
        let result = success(es.forecast(&values, 1).unwrap());
        assert!((result.forecast[0] - 14.0).abs() < 1e-12);

        let narrow = ExponentialSmoothingForecaster::new(0.5)
            .unwrap()
            .with_span(2)
            .unwrap();
        let result = success(narrow.forecast(&values, 1).unwrap());
        // weights 0.5, 0.25 -> 2/3, 1/3 on 14, 13
        assert!((result.forecast[0] - (14.0 * 2.0 / 3.0 + 13.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ExponentialSmoothingForecaster::new(0.0).is_err());
        assert!(ExponentialSmoothingForecaster::new(1.5).is_err());
        assert!(LinearTrendForecaster::with_confidence_z(-1.0).is_err());
        assert!(matches!(
            LinearTrendForecaster::new().forecast(&SERIES, 0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_short_series_is_insufficient() {
        for values in [&[][..], &[1.0][..], &[1.0, 2.0][..]] {
            let linear = LinearTrendForecaster::new().forecast(values, 2).unwrap();
            assert!(!linear.is_success());
            assert!(linear.error_message().unwrap().contains("linear"));

            let es = ExponentialSmoothingForecaster::default()
                .forecast(values, 2)
                .unwrap();
            assert!(!es.is_success());
        }
    }

    #[test]
    fn test_scenario_adjustment() {
        let result = success(
            SimpleMovingAverageForecaster::default()
                .forecast(&SERIES, 2)
                .unwrap(),
        );
        let optimistic = result.scenario(10.0);
        let pessimistic = result.scenario(-20.0);
        assert_eq!(optimistic.len(), 2);
        assert!(optimistic.iter().all(|v| (v - 137.5).abs() < 1e-9));
        assert!(pessimistic.iter().all(|v| (v - 100.0).abs() < 1e-9));
    }

    #[test]
    fn test_forecast_series_labels_periods() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let series = TimeSeries::from_monthly_values(start, &SERIES).unwrap();
        let result = success(
            LinearTrendForecaster::new()
                .forecast_series(&series, 2)
                .unwrap(),
        );
        assert_eq!(
            result.periods,
            vec![
                NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            ]
        );
    }
}
