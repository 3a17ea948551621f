//! Metrics for evaluating forecasts and regression fits

use crate::error::{Error, Result};
use serde::Serialize;

fn check_inputs(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::DimensionMismatch(format!(
            "actual and predicted lengths differ: {} vs {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(Error::EmptyData(
            "cannot evaluate an empty forecast".to_string(),
        ));
    }
    Ok(())
}

/// Mean Squared Error
///
/// # Arguments
/// * `y_true` - actual values
/// * `y_pred` - predicted values
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_inputs(y_true, y_pred)?;

    let sum_squared_error = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&true_val, &pred_val)| {
            let error = true_val - pred_val;
            error * error
        })
        .sum::<f64>();

    Ok(sum_squared_error / y_true.len() as f64)
}

/// Mean Absolute Error
///
/// # Arguments
/// * `y_true` - actual values
/// * `y_pred` - predicted values
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_inputs(y_true, y_pred)?;

    let sum_absolute_error = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&true_val, &pred_val)| (true_val - pred_val).abs())
        .sum::<f64>();

    Ok(sum_absolute_error / y_true.len() as f64)
}

/// Root Mean Squared Error
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    let mse = mean_squared_error(y_true, y_pred)?;
    Ok(mse.sqrt())
}

/// Mean Absolute Percentage Error, in percent
///
/// Observations whose actual value is zero are left out of the mean. When
/// every actual value is zero the result is NaN.
pub fn mean_absolute_percentage_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_inputs(y_true, y_pred)?;

    let (sum, count) = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(&true_val, _)| true_val != 0.0)
        .fold((0.0, 0usize), |(sum, count), (&true_val, &pred_val)| {
            (sum + ((true_val - pred_val) / true_val).abs(), count + 1)
        });

    if count == 0 {
        log::warn!("MAPE undefined: all {} actual values are zero", y_true.len());
        return Ok(f64::NAN);
    }
    if count < y_true.len() {
        log::debug!(
            "MAPE skips {} zero-valued actuals",
            y_true.len() - count
        );
    }

    Ok(sum / count as f64 * 100.0)
}

/// Coefficient of determination (R^2)
///
/// 1 is a perfect fit and the score can be negative. When the actual values
/// are constant the score is 1 for an exact fit and 0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_inputs(y_true, y_pred)?;

    let y_mean = y_true.iter().sum::<f64>() / y_true.len() as f64;

    // total sum of squares
    let ss_tot = y_true
        .iter()
        .map(|&true_val| {
            let diff = true_val - y_mean;
            diff * diff
        })
        .sum::<f64>();

    // residual sum of squares
    let ss_res = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&true_val, &pred_val)| {
            let error = true_val - pred_val;
            error * error
        })
        .sum::<f64>();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            Ok(1.0)
        } else {
            Ok(0.0)
        }
    } else {
        Ok(1.0 - (ss_res / ss_tot))
    }
}

/// Accuracy of a forecast against observed values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Percent, averaged over the observations whose actual value is non-zero.
    /// Zero actuals are left out instead of making the mean infinite; NaN when
    /// every actual value is zero.
    pub mape: f64,
}

/// MAE, MSE, RMSE and MAPE of `predicted` against `actual`
///
/// MAPE leaves out zero actuals (see [`ForecastAccuracy::mape`]). Mismatched
/// or empty inputs are a caller error.
///
/// # Example
/// ```rust
/// use pulse_analytics::ml::metrics::evaluate_forecast_accuracy;
///
/// let accuracy = evaluate_forecast_accuracy(&[100.0, 200.0, 300.0], &[110.0, 190.0, 300.0]).unwrap();
/// assert!((accuracy.mae - 6.67).abs() < 0.01);
/// ```
pub fn evaluate_forecast_accuracy(actual: &[f64], predicted: &[f64]) -> Result<ForecastAccuracy> {
    let mse = mean_squared_error(actual, predicted)?;
    Ok(ForecastAccuracy {
        mae: mean_absolute_error(actual, predicted)?,
        mse,
        rmse: mse.sqrt(),
        mape: mean_absolute_percentage_error(actual, predicted)?,
    })
}
