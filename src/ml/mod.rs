//! Machine learning module
//!
//! Feature standardisation, isolation-based and statistical anomaly
//! detection, and forecast accuracy metrics.

pub mod anomaly_detection;
pub mod metrics;
pub mod preprocessing;
