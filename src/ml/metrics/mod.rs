//! Evaluation metrics

pub mod regression;

pub use regression::{evaluate_forecast_accuracy, ForecastAccuracy};
