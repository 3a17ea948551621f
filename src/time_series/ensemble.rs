//! Ensemble forecasting
//!
//! Runs a list of strategies, discards the ones that report insufficient
//! data, and averages the rest step by step. Only the linear member
//! extrapolates; the flat members pull the average towards recent levels.

use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::time_series::forecasting::{
    check_horizon, standard_strategies, ForecastOutcome, ForecastResult, Forecaster,
};
use crate::time_series::TimeSeries;

/// Label reported for combined forecasts
pub const ENSEMBLE_MODEL_TYPE: &str = "Ensemble (Average)";

/// Unweighted per-step mean of several forecasting strategies
pub struct EnsembleForecaster {
    members: Vec<Box<dyn Forecaster + Send + Sync>>,
}

impl EnsembleForecaster {
    pub const NAME: &'static str = "ensemble";

    /// An ensemble with no members; add them with [`EnsembleForecaster::with_member`]
    pub fn empty() -> Self {
        EnsembleForecaster {
            members: Vec::new(),
        }
    }

    /// Linear trend, moving average and exponential smoothing built from `config`
    pub fn from_config(config: &ForecastConfig) -> Result<Self> {
        let (linear, moving_average, smoothing) = standard_strategies(config)?;
        Ok(Self::empty()
            .with_member(linear)
            .with_member(moving_average)
            .with_member(smoothing))
    }

    pub fn with_member<F>(mut self, member: F) -> Self
    where
        F: Forecaster + Send + Sync + 'static,
    {
        self.members.push(Box::new(member));
        self
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }
}

impl Default for EnsembleForecaster {
    fn default() -> Self {
        use crate::time_series::forecasting::{
            ExponentialSmoothingForecaster, LinearTrendForecaster, SimpleMovingAverageForecaster,
        };

        Self::empty()
            .with_member(LinearTrendForecaster::default())
            .with_member(SimpleMovingAverageForecaster::default())
            .with_member(ExponentialSmoothingForecaster::default())
    }
}

impl Forecaster for EnsembleForecaster {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_observations(&self) -> usize {
        self.members
            .iter()
            .map(|m| m.min_observations())
            .min()
            .unwrap_or(0)
    }

    fn forecast(&self, values: &[f64], horizon: usize) -> Result<ForecastOutcome> {
        check_horizon(horizon)?;
        if self.members.is_empty() {
            return Err(Error::InvalidInput("ensemble has no members".into()));
        }

        let mut components: Vec<ForecastResult> = Vec::with_capacity(self.members.len());
        for member in &self.members {
            match member.forecast(values, horizon)? {
                ForecastOutcome::Success(result) => components.push(result),
                ForecastOutcome::InsufficientData {
                    method,
                    required,
                    available,
                } => {
                    log::debug!(
                        "ensemble member {} skipped: needs {} observations, got {}",
                        method,
                        required,
                        available
                    );
                }
            }
        }

        if components.is_empty() {
            return Ok(ForecastOutcome::InsufficientData {
                method: Self::NAME.to_string(),
                required: self.min_observations(),
                available: values.len(),
            });
        }

        let count = components.len() as f64;
        let forecast: Vec<f64> = (0..horizon)
            .map(|step| components.iter().map(|c| c.forecast[step]).sum::<f64>() / count)
            .collect();

        let mut result = ForecastResult::new(Self::NAME, ENSEMBLE_MODEL_TYPE.to_string(), forecast);
        result.methods_used = components.iter().map(|c| c.method.clone()).collect();
        result.components = components;

        Ok(ForecastOutcome::Success(result))
    }
}

/// Forecast `horizon` periods with the default three-strategy ensemble
///
/// # Example
/// ```rust
/// use pulse_analytics::time_series::ensemble_forecast;
///
/// let outcome = ensemble_forecast(&[100.0, 110.0, 105.0, 120.0, 130.0, 125.0], 3).unwrap();
/// let result = outcome.result().unwrap();
/// assert_eq!(result.forecast.len(), 3);
/// assert_eq!(result.methods_used.len(), 3);
/// ```
pub fn ensemble_forecast(values: &[f64], horizon: usize) -> Result<ForecastOutcome> {
    EnsembleForecaster::default().forecast(values, horizon)
}

/// Forecast `config.horizon` months past the end of `series` with the
/// ensemble described by `config`
pub fn forecast_with_config(series: &TimeSeries, config: &ForecastConfig) -> Result<ForecastOutcome> {
    EnsembleForecaster::from_config(config)?.forecast_series(series, config.horizon)
}
