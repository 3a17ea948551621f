//! Trend analysis: direction and strength of a linear trend

use crate::stats::descriptive::pearson_impl;
use crate::stats::inference::pearson_pvalue;
use crate::stats::Strength;
use crate::time_series::forecasting::LinearFit;
use serde::Serialize;
use std::fmt;

/// Sign of the fitted slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendDirection::Increasing => "Increasing",
            TrendDirection::Decreasing => "Decreasing",
            TrendDirection::Stable => "Stable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value of the slope; NaN with only two points
    pub p_value: f64,
    pub direction: TrendDirection,
    pub strength: Strength,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendOutcome {
    Computed(TrendAnalysis),
    InsufficientData { required: usize, available: usize },
}

impl TrendOutcome {
    pub fn analysis(&self) -> Option<&TrendAnalysis> {
        match self {
            TrendOutcome::Computed(analysis) => Some(analysis),
            TrendOutcome::InsufficientData { .. } => None,
        }
    }
}

/// Fit a line through the series and label its direction and strength
///
/// A constant series is reported as a weak, stable trend with r = 0.
pub fn analyze_trend(values: &[f64]) -> TrendOutcome {
    let n = values.len();
    let fit = match LinearFit::fit(values) {
        Ok(fit) => fit,
        Err(_) => {
            return TrendOutcome::InsufficientData {
                required: 2,
                available: n,
            }
        }
    };

    let index: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let r = pearson_impl(&index, values).unwrap_or(0.0);

    let direction = if fit.slope > 0.0 {
        TrendDirection::Increasing
    } else if fit.slope < 0.0 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    let strength = Strength::from_coefficient(r);

    TrendOutcome::Computed(TrendAnalysis {
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: r * r,
        p_value: pearson_pvalue(r, n),
        direction,
        strength,
        interpretation: format!(
            "{} {} trend",
            strength,
            direction.to_string().to_lowercase()
        ),
    })
}
