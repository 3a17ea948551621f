// Statistics module
//
// Univariate summaries, pairwise and partial correlation with significance,
// and distribution-concentration measures used by the dashboard's drilldowns.

pub mod descriptive;
pub mod inference;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interpretation reported when fewer than three paired observations remain
pub const INSUFFICIENT_DATA: &str = "Insufficient data";

/// Interpretation reported when one side of a pair has zero variance
pub const CONSTANT_INPUT: &str = "Constant input";

/// Significance level used for the significance label
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Univariate summary of a numeric column
///
/// With a single value the standard deviation is reported as 0 rather than
/// NaN, so the coefficient of variation is 0 too.
///
/// # Example
/// ```rust
/// use pulse_analytics::stats;
///
/// let summary = stats::univariate_analysis(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(summary.median, 3.0);
/// ```
pub fn univariate_analysis(data: &[f64]) -> Result<DescriptiveStats> {
    descriptive::describe_impl(data)
}

/// Summary statistics of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator); 0 for a single value
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// 25% quantile (linear interpolation)
    pub q25: f64,
    /// 75% quantile (linear interpolation)
    pub q75: f64,
    pub iqr: f64,
    /// Biased Fisher-Pearson skewness; NaN for constant data
    pub skewness: f64,
    /// Biased excess kurtosis; NaN for constant data
    pub kurtosis: f64,
    /// std / mean * 100, or 0 when the mean is 0
    pub coefficient_of_variation: f64,
}

/// Pearson correlation coefficient
///
/// Fails on mismatched lengths, fewer than two points, or a zero-variance input.
pub fn correlation(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch(format!(
            "correlation inputs differ in length: x={}, y={}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(Error::InsufficientData(
            "correlation needs at least two data points".into(),
        ));
    }
    descriptive::pearson_impl(x, y)
        .ok_or_else(|| Error::InvalidValue("correlation: zero variance".into()))
}

/// Correlation coefficient family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
    Kendall,
}

impl FromStr for CorrelationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            "kendall" => Ok(CorrelationMethod::Kendall),
            other => Err(Error::InvalidInput(format!(
                "unknown correlation method: {}",
                other
            ))),
        }
    }
}

/// Strength of a correlation by absolute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    pub fn from_coefficient(r: f64) -> Self {
        let abs = r.abs();
        if abs < 0.3 {
            Strength::Weak
        } else if abs < 0.7 {
            Strength::Moderate
        } else {
            Strength::Strong
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strength::Weak => "Weak",
            Strength::Moderate => "Moderate",
            Strength::Strong => "Strong",
        };
        f.write_str(label)
    }
}

/// Sign of a correlation; zero is reported as negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Positive,
    Negative,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Positive => f.write_str("Positive"),
            Direction::Negative => f.write_str("Negative"),
        }
    }
}

/// Result of [`bivariate_correlation`]
///
/// `strength`, `direction` and `significant` are `None` whenever no
/// coefficient could be computed; `interpretation` then says why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub method: CorrelationMethod,
    /// Number of complete pairs used
    pub n: usize,
    pub correlation: f64,
    /// Two-sided. Pearson and Spearman use the t distribution with n - 2
    /// degrees of freedom; Kendall is exact for untied samples up to 33 pairs
    /// and asymptotic (tie-corrected normal) otherwise.
    pub p_value: f64,
    pub strength: Option<Strength>,
    pub direction: Option<Direction>,
    pub significant: Option<bool>,
    pub interpretation: String,
}

impl CorrelationResult {
    fn undefined(method: CorrelationMethod, n: usize, reason: &str) -> Self {
        CorrelationResult {
            method,
            n,
            correlation: f64::NAN,
            p_value: f64::NAN,
            strength: None,
            direction: None,
            significant: None,
            interpretation: reason.to_string(),
        }
    }
}

/// Correlation between two columns with a two-sided p-value
///
/// Pairs where either side is missing are dropped. Fewer than three complete
/// pairs yield an "Insufficient data" result rather than an error; mismatched
/// column lengths are a caller error.
///
/// # Example
/// ```rust
/// use pulse_analytics::stats::{self, CorrelationMethod};
///
/// let x = [Some(1.0), Some(2.0)];
/// let y = [Some(2.0), Some(4.0)];
/// let result = stats::bivariate_correlation(&x, &y, CorrelationMethod::Pearson).unwrap();
/// assert_eq!(result.interpretation, "Insufficient data");
/// assert!(result.correlation.is_nan());
/// ```
pub fn bivariate_correlation(
    x: &[Option<f64>],
    y: &[Option<f64>],
    method: CorrelationMethod,
) -> Result<CorrelationResult> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    let n = xs.len();

    if n < 3 {
        return Ok(CorrelationResult::undefined(method, n, INSUFFICIENT_DATA));
    }

    let computed = match method {
        CorrelationMethod::Pearson => descriptive::pearson_impl(&xs, &ys)
            .map(|r| (r, inference::pearson_pvalue(r, n))),
        CorrelationMethod::Spearman => descriptive::spearman_impl(&xs, &ys)
            .map(|r| (r, inference::pearson_pvalue(r, n))),
        CorrelationMethod::Kendall => inference::kendall_tau_b(&xs, &ys),
    };

    let (r, p_value) = match computed {
        Some(pair) => pair,
        None => {
            log::warn!(
                "{:?} correlation undefined: one input has zero variance ({} pairs)",
                method,
                n
            );
            return Ok(CorrelationResult::undefined(method, n, CONSTANT_INPUT));
        }
    };

    let strength = Strength::from_coefficient(r);
    let direction = if r > 0.0 {
        Direction::Positive
    } else {
        Direction::Negative
    };
    let significant = p_value < SIGNIFICANCE_LEVEL;
    let significance = if significant {
        "significant"
    } else {
        "not significant"
    };

    Ok(CorrelationResult {
        method,
        n,
        correlation: r,
        p_value,
        strength: Some(strength),
        direction: Some(direction),
        significant: Some(significant),
        interpretation: format!(
            "{} {} correlation ({})",
            strength,
            direction.to_string().to_lowercase(),
            significance
        ),
    })
}

/// Pairwise and partial correlations of three columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrivariateResult {
    pub n: usize,
    pub correlation_xy: f64,
    pub correlation_xz: f64,
    pub correlation_yz: f64,
    /// Correlation of x and y after controlling for z
    pub partial_correlation_xy_given_z: f64,
    pub interpretation: String,
}

/// Partial correlation of x and y given z, over rows where all three are present
///
/// Zero-variance inputs give NaN coefficients rather than errors.
pub fn trivariate_analysis(
    x: &[Option<f64>],
    y: &[Option<f64>],
    z: &[Option<f64>],
) -> Result<TrivariateResult> {
    if x.len() != y.len() || x.len() != z.len() {
        return Err(Error::DimensionMismatch(format!(
            "trivariate inputs differ in length: x={}, y={}, z={}",
            x.len(),
            y.len(),
            z.len()
        )));
    }

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut zs = Vec::new();
    for ((a, b), c) in x.iter().zip(y).zip(z) {
        if let (Some(a), Some(b), Some(c)) = (a, b, c) {
            xs.push(*a);
            ys.push(*b);
            zs.push(*c);
        }
    }
    let n = xs.len();

    if n < 3 {
        return Ok(TrivariateResult {
            n,
            correlation_xy: f64::NAN,
            correlation_xz: f64::NAN,
            correlation_yz: f64::NAN,
            partial_correlation_xy_given_z: f64::NAN,
            interpretation: INSUFFICIENT_DATA.to_string(),
        });
    }

    let r_xy = descriptive::pearson_impl(&xs, &ys).unwrap_or(f64::NAN);
    let r_xz = descriptive::pearson_impl(&xs, &zs).unwrap_or(f64::NAN);
    let r_yz = descriptive::pearson_impl(&ys, &zs).unwrap_or(f64::NAN);

    let denominator = (1.0 - r_xz * r_xz) * (1.0 - r_yz * r_yz);
    let partial = if denominator > 0.0 {
        (r_xy - r_xz * r_yz) / denominator.sqrt()
    } else {
        f64::NAN
    };

    Ok(TrivariateResult {
        n,
        correlation_xy: r_xy,
        correlation_xz: r_xz,
        correlation_yz: r_yz,
        partial_correlation_xy_given_z: partial,
        interpretation:
            "Partial correlation shows relationship between X and Y after controlling for Z"
                .to_string(),
    })
}

/// Gini coefficient of the non-negative values (0 = equal, 1 = concentrated)
pub fn gini_coefficient(values: &[f64]) -> f64 {
    descriptive::gini_impl(values)
}

/// Share of the total held by the `top_n` largest values
pub fn concentration_ratio(values: &[f64], top_n: usize) -> f64 {
    descriptive::concentration_ratio_impl(values, top_n)
}
