//! # pulse-analytics
//!
//! Analytics core for an enrolment monitoring dashboard:
//!
//! - [`time_series`]: linear trend, moving average and exponential smoothing
//!   forecasts, their ensemble, and trend analysis
//! - [`ml::anomaly_detection`]: Isolation Forest plus IQR and Z-score rules
//! - [`stats`]: univariate summaries, correlation, inequality measures
//! - [`ml::metrics`]: forecast accuracy
//!
//! ```rust
//! use pulse_analytics::{Forecaster, EnsembleForecaster, TimeSeries};
//!
//! let series = TimeSeries::from_monthly_values(
//!     chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     &[100.0, 110.0, 105.0, 120.0, 130.0, 125.0],
//! )
//! .unwrap();
//! let outcome = EnsembleForecaster::default().forecast_series(&series, 3).unwrap();
//! assert_eq!(outcome.result().unwrap().periods.len(), 3);
//! ```

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod error;
pub mod ml;
pub mod stats;
pub mod table;
pub mod time_series;

// Re-export commonly used types
pub use config::{AnalyticsConfig, ForecastConfig, IsolationForestConfig, StatisticalConfig};
pub use error::{Error, Result};
pub use ml::anomaly_detection::{
    detect_anomalies_isolation_forest, detect_statistical_anomalies, AnomalyDetector,
    AnomalyResult, StatisticalMethod,
};
pub use ml::metrics::{evaluate_forecast_accuracy, ForecastAccuracy};
pub use stats::{
    bivariate_correlation, univariate_analysis, CorrelationMethod, CorrelationResult,
    DescriptiveStats,
};
pub use table::FeatureTable;
pub use time_series::{
    ensemble_forecast, forecast_with_config, EnsembleForecaster, ForecastOutcome,
    ForecastResult, Forecaster, TimeSeries,
};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
