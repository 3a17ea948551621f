//! Parameter sets for the forecasting and anomaly-detection routines.
//!
//! Every parameter has a default matching the dashboard's behaviour, so an
//! empty TOML document yields a usable [`AnalyticsConfig`]. The core never
//! reads files or environment variables itself; callers hand over the text.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the forecast engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of future periods to forecast
    pub horizon: usize,
    /// Trailing window of the moving-average strategy
    pub ma_window: usize,
    /// Decay parameter of the exponential-smoothing strategy
    pub alpha: f64,
    /// Maximum number of recent observations the smoothing strategy weighs
    pub smoothing_span: usize,
    /// Multiplier applied to the residual std-dev for the linear band (1.96 = 95%)
    pub confidence_z: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            horizon: 3,
            ma_window: 3,
            alpha: 0.3,
            smoothing_span: 10,
            confidence_z: 1.96,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(Error::InvalidValue("horizon must be at least 1".into()));
        }
        if self.ma_window == 0 {
            return Err(Error::InvalidValue("ma_window must be at least 1".into()));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::InvalidValue(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.smoothing_span == 0 {
            return Err(Error::InvalidValue(
                "smoothing_span must be at least 1".into(),
            ));
        }
        if !(self.confidence_z.is_finite() && self.confidence_z > 0.0) {
            return Err(Error::InvalidValue(format!(
                "confidence_z must be positive, got {}",
                self.confidence_z
            )));
        }
        Ok(())
    }
}

/// Builder for [`ForecastConfig`]
pub struct ForecastConfigBuilder {
    config: ForecastConfig,
}

impl ForecastConfigBuilder {
    pub fn new() -> Self {
        ForecastConfigBuilder {
            config: ForecastConfig::default(),
        }
    }

    pub fn horizon(mut self, horizon: usize) -> Self {
        self.config.horizon = horizon;
        self
    }

    pub fn ma_window(mut self, window: usize) -> Self {
        self.config.ma_window = window;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    pub fn smoothing_span(mut self, span: usize) -> Self {
        self.config.smoothing_span = span;
        self
    }

    pub fn confidence_z(mut self, z: f64) -> Self {
        self.config.confidence_z = z;
        self
    }

    pub fn build(self) -> Result<ForecastConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ForecastConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the Isolation Forest detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationForestConfig {
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Sub-sample size per tree (None = min(256, n_samples))
    pub max_samples: Option<usize>,
    /// Expected fraction of anomalous rows, in (0, 1)
    pub contamination: f64,
    /// Seed for tree construction
    pub random_seed: u64,
    /// Below this many complete rows detection is skipped
    pub min_samples: usize,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        IsolationForestConfig {
            n_estimators: 100,
            max_samples: None,
            contamination: 0.1,
            random_seed: 42,
            min_samples: 10,
        }
    }
}

impl IsolationForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Error::InvalidValue("n_estimators must be at least 1".into()));
        }
        if self.max_samples == Some(0) {
            return Err(Error::InvalidValue("max_samples must be at least 1".into()));
        }
        if !(self.contamination > 0.0 && self.contamination < 1.0) {
            return Err(Error::InvalidInput(format!(
                "contamination must be in (0, 1), got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}

/// Builder for [`IsolationForestConfig`]
pub struct IsolationForestConfigBuilder {
    config: IsolationForestConfig,
}

impl IsolationForestConfigBuilder {
    pub fn new() -> Self {
        IsolationForestConfigBuilder {
            config: IsolationForestConfig::default(),
        }
    }

    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    pub fn max_samples(mut self, samples: usize) -> Self {
        self.config.max_samples = Some(samples);
        self
    }

    pub fn contamination(mut self, contamination: f64) -> Self {
        self.config.contamination = contamination;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    pub fn min_samples(mut self, samples: usize) -> Self {
        self.config.min_samples = samples;
        self
    }

    pub fn build(self) -> Result<IsolationForestConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for IsolationForestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of the single-column IQR and Z-score detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalConfig {
    /// k in Q1 - k*IQR / Q3 + k*IQR
    pub iqr_multiplier: f64,
    /// Absolute standard score above which a value is flagged
    pub zscore_threshold: f64,
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        StatisticalConfig {
            iqr_multiplier: 3.0,
            zscore_threshold: 3.0,
        }
    }
}

impl StatisticalConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier >= 0.0) {
            return Err(Error::InvalidValue(format!(
                "iqr_multiplier must be non-negative, got {}",
                self.iqr_multiplier
            )));
        }
        if !(self.zscore_threshold.is_finite() && self.zscore_threshold > 0.0) {
            return Err(Error::InvalidValue(format!(
                "zscore_threshold must be positive, got {}",
                self.zscore_threshold
            )));
        }
        Ok(())
    }
}

/// All analytics parameters in one document
///
/// ```toml
/// [forecast]
/// horizon = 6
///
/// [anomaly]
/// contamination = 0.05
/// random_seed = 7
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub forecast: ForecastConfig,
    pub anomaly: IsolationForestConfig,
    pub statistical: StatisticalConfig,
}

impl AnalyticsConfig {
    /// Parse and validate a TOML parameter document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnalyticsConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.forecast.validate()?;
        self.anomaly.validate()?;
        self.statistical.validate()
    }
}
