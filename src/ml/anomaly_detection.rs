//! Anomaly detection module
//!
//! Flags outlier rows of a [`FeatureTable`]:
//!
//! - [`AnomalyDetector`]: standardised features scored by an Isolation Forest
//! - [`detect_statistical_anomalies`]: IQR fences or Z-scores on one column
//!
//! Rows dropped for missing values are reported as non-anomalous; their
//! `scores` entry is `None` so callers can tell "unscored" from "normal".

use crate::config::{IsolationForestConfig, StatisticalConfig};
use crate::error::{Error, Result};
use crate::ml::preprocessing::{check_matrix, StandardScaler};
use crate::stats::descriptive::percentile;
use crate::table::FeatureTable;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search among `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Node of an isolation tree
#[derive(Debug, Clone)]
enum ITreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<ITreeNode>,
        right: Box<ITreeNode>,
    },
    Leaf {
        /// Training rows that reached this node
        size: usize,
    },
}

impl ITreeNode {
    /// Depth at which `x` is isolated, adjusted for unsplit leaves
    fn path_length(&self, x: &[f64], depth: usize) -> f64 {
        match self {
            ITreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if x[*feature] < *threshold {
                    left.path_length(x, depth + 1)
                } else {
                    right.path_length(x, depth + 1)
                }
            }
            ITreeNode::Leaf { size } => depth as f64 + average_path_length(*size),
        }
    }
}

/// Isolation Forest outlier scorer
///
/// Trees are grown on random sub-samples by splitting a random non-constant
/// feature at a uniform threshold. Points that isolate in few splits score
/// close to 1; typical points score well below 0.5.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    config: IsolationForestConfig,
    trees: Vec<ITreeNode>,
    sub_sample_size: usize,
    n_features: usize,
}

impl IsolationForest {
    pub fn new(config: IsolationForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(IsolationForest {
            config,
            trees: Vec::new(),
            sub_sample_size: 0,
            n_features: 0,
        })
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    fn build_tree(
        data: &[Vec<f64>],
        indices: &[usize],
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> ITreeNode {
        if depth >= height_limit || indices.len() <= 1 {
            return ITreeNode::Leaf {
                size: indices.len(),
            };
        }

        // Features that still vary among the rows at this node
        let n_features = data[indices[0]].len();
        let ranges: Vec<(usize, f64, f64)> = (0..n_features)
            .filter_map(|feature| {
                let (min, max) = indices.iter().map(|&i| data[i][feature]).fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(min, max), v| (min.min(v), max.max(v)),
                );
                (max > min).then_some((feature, min, max))
            })
            .collect();

        if ranges.is_empty() {
            return ITreeNode::Leaf {
                size: indices.len(),
            };
        }

        let (feature, min, max) = ranges[rng.random_range(0..ranges.len())];
        let threshold = min + rng.random::<f64>() * (max - min);

        let (left, right): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| data[i][feature] < threshold);

        ITreeNode::Split {
            feature,
            threshold,
            left: Box::new(Self::build_tree(data, &left, depth + 1, height_limit, rng)),
            right: Box::new(Self::build_tree(data, &right, depth + 1, height_limit, rng)),
        }
    }

    /// Grow the forest on row-major `data`
    pub fn fit(&mut self, data: &[Vec<f64>]) -> Result<()> {
        let n_features = check_matrix(data)?;
        let n_samples = data.len();

        let mut rng = StdRng::seed_from_u64(self.config.random_seed);

        let sub_sample_size = match self.config.max_samples {
            Some(size) => size.min(n_samples),
            None => n_samples.min(256),
        };
        let height_limit = (sub_sample_size.max(2) as f64).log2().ceil() as usize;

        self.trees = (0..self.config.n_estimators)
            .map(|_| {
                let sample = index::sample(&mut rng, n_samples, sub_sample_size).into_vec();
                Self::build_tree(data, &sample, 0, height_limit, &mut rng)
            })
            .collect();
        self.sub_sample_size = sub_sample_size;
        self.n_features = n_features;

        log::debug!(
            "isolation forest fitted: {} trees, sub-sample {}, height limit {}",
            self.trees.len(),
            sub_sample_size,
            height_limit
        );
        Ok(())
    }

    /// Anomaly score in (0, 1] for each row; higher is more anomalous
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(Error::InvalidInput(
                "IsolationForest has not been fitted yet".into(),
            ));
        }
        let n_features = check_matrix(data)?;
        if n_features != self.n_features {
            return Err(Error::LengthMismatch {
                expected: self.n_features,
                actual: n_features,
            });
        }

        let expected_path_length = average_path_length(self.sub_sample_size);
        let n_trees = self.trees.len() as f64;

        Ok(data
            .iter()
            .map(|x| {
                if expected_path_length <= 0.0 {
                    return 0.5;
                }
                let avg_path_length =
                    self.trees.iter().map(|t| t.path_length(x, 0)).sum::<f64>() / n_trees;
                2.0_f64.powf(-avg_path_length / expected_path_length)
            })
            .collect())
    }

    /// Fit, score, and flag rows scoring above the `1 - contamination` quantile
    ///
    /// The cut-off is the linear-interpolated quantile of the scores and the
    /// comparison is strict, so at most `ceil(contamination · n)` rows are
    /// flagged and rows that cannot be told apart (equal scores) are never
    /// flagged as a group. A table of identical rows yields no outliers.
    pub fn fit_predict(&mut self, data: &[Vec<f64>]) -> Result<IsolationLabels> {
        self.fit(data)?;
        let scores = self.score_samples(data)?;

        let mut sorted_scores = scores.clone();
        sorted_scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let threshold = percentile(&sorted_scores, 1.0 - self.config.contamination);

        let labels = scores.iter().map(|&s| s > threshold).collect();
        Ok(IsolationLabels {
            scores,
            threshold,
            labels,
        })
    }
}

/// Scores and outlier labels from [`IsolationForest::fit_predict`]
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationLabels {
    pub scores: Vec<f64>,
    /// Rows scoring strictly above this value are outliers
    pub threshold: f64,
    pub labels: Vec<bool>,
}

/// How an [`AnomalyResult`] was produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DetectionMethod {
    IsolationForest { contamination: f64, random_seed: u64 },
    Iqr { k: f64 },
    ZScore { threshold: f64 },
}

/// A feature table with one boolean flag per row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyResult {
    pub table: FeatureTable,
    pub method: DetectionMethod,
    /// Aligned with the table rows; rows without data are `false`
    pub is_anomaly: Vec<bool>,
    /// Per-row score (isolation score or |z|); `None` where a row was not scored
    pub scores: Vec<Option<f64>>,
    /// Score cut-off (isolation score, or the z threshold)
    pub threshold: Option<f64>,
    /// Rows that had every selected feature present
    pub rows_scored: usize,
    /// False when detection was skipped for lack of data
    pub detection_ran: bool,
}

impl AnomalyResult {
    fn unflagged(table: &FeatureTable, method: DetectionMethod, rows_scored: usize) -> Self {
        let n = table.row_count();
        AnomalyResult {
            table: table.clone(),
            method,
            is_anomaly: vec![false; n],
            scores: vec![None; n],
            threshold: None,
            rows_scored,
            detection_ran: false,
        }
    }

    pub fn anomaly_count(&self) -> usize {
        self.is_anomaly.iter().filter(|&&flag| flag).count()
    }

    /// Identifiers of the flagged rows, in table order
    pub fn anomalous_ids(&self) -> Vec<&str> {
        self.table
            .ids()
            .iter()
            .zip(self.is_anomaly.iter())
            .filter(|(_, &flag)| flag)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// `(identifier, is_anomaly)` per row
    pub fn rows(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.table
            .ids()
            .iter()
            .map(String::as_str)
            .zip(self.is_anomaly.iter().copied())
    }
}

/// Multi-feature anomaly detector backed by an Isolation Forest
///
/// # Example
/// ```rust
/// use pulse_analytics::ml::anomaly_detection::AnomalyDetector;
/// use pulse_analytics::table::FeatureTable;
///
/// let ids: Vec<String> = (0..5).map(|i| format!("district-{}", i)).collect();
/// let table = FeatureTable::new(ids)
///     .with_column("enrolments", vec![10.0, 12.0, 11.0, 13.0, 500.0])
///     .unwrap();
///
/// // five rows are too few to score; nothing is flagged
/// let result = AnomalyDetector::with_contamination(0.1)
///     .unwrap()
///     .detect(&table, &["enrolments"])
///     .unwrap();
/// assert!(result.is_anomaly.iter().all(|flag| !flag));
/// ```
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: IsolationForestConfig,
}

impl AnomalyDetector {
    pub fn new(config: IsolationForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(AnomalyDetector { config })
    }

    /// Default forest (100 trees, seed 42) with the given contamination
    pub fn with_contamination(contamination: f64) -> Result<Self> {
        Self::new(IsolationForestConfig {
            contamination,
            ..IsolationForestConfig::default()
        })
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    /// Flag outlier rows of `table` using the named feature columns
    pub fn detect<S: AsRef<str>>(&self, table: &FeatureTable, features: &[S]) -> Result<AnomalyResult> {
        let method = DetectionMethod::IsolationForest {
            contamination: self.config.contamination,
            random_seed: self.config.random_seed,
        };

        let (rows, matrix) = table.complete_rows(features)?;
        if rows.len() < self.config.min_samples {
            log::debug!(
                "anomaly detection skipped: {} complete rows, need {}",
                rows.len(),
                self.config.min_samples
            );
            return Ok(AnomalyResult::unflagged(table, method, rows.len()));
        }

        let names: Vec<String> = features.iter().map(|f| f.as_ref().to_string()).collect();
        let scaled = StandardScaler::new(names).fit_transform(&matrix)?;

        let mut forest = IsolationForest::new(self.config.clone())?;
        let labels = forest.fit_predict(&scaled)?;

        let mut result = AnomalyResult::unflagged(table, method, rows.len());
        for (pos, &row) in rows.iter().enumerate() {
            result.is_anomaly[row] = labels.labels[pos];
            result.scores[row] = Some(labels.scores[pos]);
        }
        result.threshold = Some(labels.threshold);
        result.detection_ran = true;

        log::debug!(
            "isolation forest flagged {} of {} rows (threshold {:.4})",
            result.anomaly_count(),
            rows.len(),
            labels.threshold
        );
        Ok(result)
    }
}

/// Isolation Forest detection with the default seed
pub fn detect_anomalies_isolation_forest<S: AsRef<str>>(
    table: &FeatureTable,
    features: &[S],
    contamination: f64,
) -> Result<AnomalyResult> {
    AnomalyDetector::with_contamination(contamination)?.detect(table, features)
}

/// Single-column outlier rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatisticalMethod {
    /// Outside [Q1 - k·IQR, Q3 + k·IQR]
    Iqr { k: f64 },
    /// |z| above the threshold (population standard deviation)
    ZScore { threshold: f64 },
}

impl StatisticalMethod {
    /// IQR fences with the configured multiplier (default 3)
    pub fn iqr(config: &StatisticalConfig) -> Self {
        StatisticalMethod::Iqr {
            k: config.iqr_multiplier,
        }
    }

    /// Z-score rule with the configured threshold (default 3)
    pub fn zscore(config: &StatisticalConfig) -> Self {
        StatisticalMethod::ZScore {
            threshold: config.zscore_threshold,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            StatisticalMethod::Iqr { k } if !(k.is_finite() && k >= 0.0) => Err(
                Error::InvalidValue(format!("IQR multiplier must be non-negative, got {}", k)),
            ),
            StatisticalMethod::ZScore { threshold } if !(threshold.is_finite() && threshold > 0.0) => {
                Err(Error::InvalidValue(format!(
                    "z-score threshold must be positive, got {}",
                    threshold
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for StatisticalMethod {
    fn default() -> Self {
        StatisticalMethod::Iqr { k: 3.0 }
    }
}

/// Flag outliers in one column with the IQR or Z-score rule
///
/// Missing cells are never flagged. For the IQR rule `scores` stays `None`.
pub fn detect_statistical_anomalies(
    table: &FeatureTable,
    column: &str,
    method: StatisticalMethod,
) -> Result<AnomalyResult> {
    method.validate()?;
    let (rows, values) = table.present_values(column)?;

    let detection = match method {
        StatisticalMethod::Iqr { k } => DetectionMethod::Iqr { k },
        StatisticalMethod::ZScore { threshold } => DetectionMethod::ZScore { threshold },
    };
    let mut result = AnomalyResult::unflagged(table, detection, rows.len());
    if values.is_empty() {
        log::debug!("column '{}' has no values; nothing to flag", column);
        return Ok(result);
    }

    match method {
        StatisticalMethod::Iqr { k } => {
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let q1 = percentile(&sorted, 0.25);
            let q3 = percentile(&sorted, 0.75);
            let iqr = q3 - q1;
            let (lower, upper) = (q1 - k * iqr, q3 + k * iqr);

            for (&row, &value) in rows.iter().zip(values.iter()) {
                result.is_anomaly[row] = value < lower || value > upper;
            }
        }
        StatisticalMethod::ZScore { threshold } => {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

            if std > 0.0 {
                for (&row, &value) in rows.iter().zip(values.iter()) {
                    let z = ((value - mean) / std).abs();
                    result.scores[row] = Some(z);
                    result.is_anomaly[row] = z > threshold;
                }
            } else {
                log::warn!(
                    "column '{}' has zero variance; z-scores undefined, nothing flagged",
                    column
                );
            }
            result.threshold = Some(threshold);
        }
    }

    result.detection_ran = true;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tight cluster around (1, 1) plus one far point at the end
    fn clustered(n: usize) -> Vec<Vec<f64>> {
        let mut data: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let t = i as f64;
                vec![1.0 + 0.01 * (t % 7.0), 1.0 + 0.01 * (t % 5.0)]
            })
            .collect();
        data.push(vec![25.0, -20.0]);
        data
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) is about 10.24
        assert!((average_path_length(256) - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn test_isolates_far_point() {
        let data = clustered(60);
        let mut forest = IsolationForest::new(IsolationForestConfig {
            contamination: 0.01,
            ..IsolationForestConfig::default()
        })
        .unwrap();
        let labels = forest.fit_predict(&data).unwrap();

        let outlier_score = labels.scores[60];
        assert!(labels
            .scores
            .iter()
            .take(60)
            .all(|&s| s < outlier_score));
        assert!(outlier_score > 0.6);
        assert!(labels.labels[60]);
        assert_eq!(labels.labels.iter().filter(|&&l| l).count(), 1);
    }

    #[test]
    fn test_seeded_forest_is_deterministic() {
        let data = clustered(40);
        let config = IsolationForestConfig {
            random_seed: 7,
            ..IsolationForestConfig::default()
        };
        let a = IsolationForest::new(config.clone())
            .unwrap()
            .fit_predict(&data)
            .unwrap();
        let b = IsolationForest::new(config).unwrap().fit_predict(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_score_requires_fit() {
        let forest = IsolationForest::new(IsolationForestConfig::default()).unwrap();
        assert!(forest.score_samples(&[vec![1.0]]).is_err());
    }

    #[test]
    fn test_constant_data_scores_uniformly() {
        let data = vec![vec![3.0, 3.0]; 20];
        let mut forest = IsolationForest::new(IsolationForestConfig::default()).unwrap();
        forest.fit(&data).unwrap();
        let scores = forest.score_samples(&data).unwrap();
        assert!(scores.windows(2).all(|w| w[0] == w[1]));

        // equal scores cannot single out any row
        let labels = forest.fit_predict(&data).unwrap();
        assert!(labels.labels.iter().all(|&l| !l));
        assert_eq!(labels.threshold, labels.scores[0]);
    }

    #[test]
    fn test_threshold_is_interpolated_quantile() {
        let data = clustered(60);
        let mut forest = IsolationForest::new(IsolationForestConfig {
            contamination: 0.1,
            ..IsolationForestConfig::default()
        })
        .unwrap();
        let labels = forest.fit_predict(&data).unwrap();

        let mut sorted = labels.scores.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(labels.threshold, percentile(&sorted, 0.9));

        let flagged = labels.labels.iter().filter(|&&l| l).count();
        assert!(flagged >= 1 && flagged <= 7);
        for (score, label) in labels.scores.iter().zip(labels.labels.iter()) {
            assert_eq!(*label, *score > labels.threshold);
        }
    }

    #[test]
    fn test_statistical_method_validation() {
        let table = FeatureTable::new(["a", "b"])
            .with_column("x", vec![1.0, 2.0])
            .unwrap();
        assert!(detect_statistical_anomalies(&table, "x", StatisticalMethod::Iqr { k: -1.0 }).is_err());
        assert!(detect_statistical_anomalies(
            &table,
            "x",
            StatisticalMethod::ZScore { threshold: 0.0 }
        )
        .is_err());
        assert!(detect_statistical_anomalies(&table, "y", StatisticalMethod::default()).is_err());
    }
}
