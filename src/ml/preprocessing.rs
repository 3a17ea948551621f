//! Feature preprocessing

use crate::error::{Error, Result};

/// Standardises each feature to zero mean and unit variance
///
/// Uses the population standard deviation. A zero-variance feature cannot be
/// scaled; it is centred (every value becomes 0) and a warning is logged.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    /// Per-feature means
    means: Vec<f64>,
    /// Per-feature standard deviations
    stds: Vec<f64>,
    /// Names used in log messages
    feature_names: Vec<String>,
    fitted: bool,
}

impl StandardScaler {
    pub fn new(feature_names: Vec<String>) -> Self {
        StandardScaler {
            means: Vec::new(),
            stds: Vec::new(),
            feature_names,
            fitted: false,
        }
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stds(&self) -> &[f64] {
        &self.stds
    }

    fn feature_name(&self, idx: usize) -> String {
        self.feature_names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("feature_{}", idx))
    }

    /// Learn per-feature mean and standard deviation from row-major data
    pub fn fit(&mut self, data: &[Vec<f64>]) -> Result<()> {
        let n_features = check_matrix(data)?;
        let n = data.len() as f64;

        let mut means = vec![0.0; n_features];
        for row in data {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in means.iter_mut() {
            *mean /= n;
        }

        let mut stds = vec![0.0; n_features];
        for row in data {
            for (j, value) in row.iter().enumerate() {
                stds[j] += (value - means[j]).powi(2);
            }
        }
        for (j, std) in stds.iter_mut().enumerate() {
            *std = (*std / n).sqrt();
            if *std <= f64::EPSILON * means[j].abs().max(1.0) {
                log::warn!(
                    "feature '{}' has zero variance over {} rows; standardised to 0",
                    self.feature_name(j),
                    data.len()
                );
                *std = 0.0;
            }
        }

        self.means = means;
        self.stds = stds;
        self.fitted = true;
        Ok(())
    }

    /// Apply the learned scaling
    pub fn transform(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        if !self.fitted {
            return Err(Error::InvalidInput(
                "StandardScaler has not been fitted yet".into(),
            ));
        }
        let n_features = check_matrix(data)?;
        if n_features != self.means.len() {
            return Err(Error::LengthMismatch {
                expected: self.means.len(),
                actual: n_features,
            });
        }

        Ok(data
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(self.stds.iter()))
                    .map(|(value, (mean, std))| {
                        if *std > 0.0 {
                            (value - mean) / std
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect())
    }

    pub fn fit_transform(&mut self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.fit(data)?;
        self.transform(data)
    }
}

/// Validate a non-empty rectangular matrix and return its width
pub(crate) fn check_matrix(data: &[Vec<f64>]) -> Result<usize> {
    let first = data
        .first()
        .ok_or_else(|| Error::EmptyData("feature matrix has no rows".into()))?;
    let width = first.len();
    if width == 0 {
        return Err(Error::EmptyData("feature matrix has no columns".into()));
    }
    if let Some(row) = data.iter().find(|row| row.len() != width) {
        return Err(Error::LengthMismatch {
            expected: width,
            actual: row.len(),
        });
    }
    Ok(width)
}
