//! Z-score anomaly detection
//!
//! Scores every retained point of a variable against the mean and sample
//! standard deviation of the whole retained series.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};
use crate::frame::DenseSeries;
use crate::stats;

/// Smallest accepted threshold
pub const MIN_THRESHOLD: f64 = 1.0;
/// Largest accepted threshold
pub const MAX_THRESHOLD: f64 = 5.0;

/// A point whose |z| exceeds the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyFlag {
    /// Bucket timestamp
    pub timestamp: DateTime<Tz>,
    /// Variable name
    pub variable: String,
    /// Observed value
    pub value: f64,
    /// Standardised score
    pub score: f64,
}

/// Outcome of anomaly detection for one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnomalyOutcome {
    /// Empty series or zero spread; no flags computed
    InsufficientVariability {
        /// Variable name
        variable: String,
    },
    /// Detection ran
    Detected {
        /// Variable name
        variable: String,
        /// Mean of the retained values
        mean: f64,
        /// Sample standard deviation of the retained values
        std: f64,
        /// Threshold applied
        threshold: f64,
        /// Flagged points, in time order
        flags: Vec<AnomalyFlag>,
    },
}

impl AnomalyOutcome {
    /// Flagged points (empty when detection was skipped)
    pub fn flags(&self) -> &[AnomalyFlag] {
        match self {
            AnomalyOutcome::Detected { flags, .. } => flags,
            AnomalyOutcome::InsufficientVariability { .. } => &[],
        }
    }
}

impl fmt::Display for AnomalyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyOutcome::InsufficientVariability { variable } => {
                write!(f, "{}: insufficient variability for z-score", variable)
            }
            AnomalyOutcome::Detected {
                variable,
                threshold,
                flags,
                ..
            } => write!(
                f,
                "{}: {} anomalies with |z| > {:.1}",
                variable,
                flags.len(),
                threshold
            ),
        }
    }
}

/// Whole-series z-score detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreDetector {
    threshold: f64,
}

impl ZScoreDetector {
    /// Create a detector; `threshold` must be positive and finite
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "anomaly threshold must be a positive number, got {}",
                threshold
            )));
        }
        Ok(ZScoreDetector { threshold })
    }

    /// Threshold on |z|
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Standardised scores, or `None` when the spread is zero or undefined
    pub fn scores(values: &[f64]) -> Option<(f64, f64, Vec<f64>)> {
        let mean = stats::mean(values)?;
        let std = stats::sample_std(values)?;
        let constant = values.iter().all(|&v| v == values[0]);
        if constant || std == 0.0 || !std.is_finite() {
            return None;
        }
        let scores = values.iter().map(|v| (v - mean) / std).collect();
        Some((mean, std, scores))
    }

    /// Flag the points of `series` with |z| above the threshold
    pub fn detect(&self, series: &DenseSeries) -> AnomalyOutcome {
        let variable = series.name().to_string();
        let (mean, std, scores) = match Self::scores(series.values()) {
            Some(scored) => scored,
            None => {
                log::info!("{}: insufficient variability for z-score", variable);
                return AnomalyOutcome::InsufficientVariability { variable };
            }
        };

        let flags = series
            .timestamps()
            .iter()
            .zip(series.values())
            .zip(scores)
            .filter(|(_, score)| score.abs() > self.threshold)
            .map(|((timestamp, value), score)| AnomalyFlag {
                timestamp: *timestamp,
                variable: variable.clone(),
                value: *value,
                score,
            })
            .collect::<Vec<_>>();

        log::debug!(
            "{}: {} of {} points flagged (mean {:.3}, std {:.3})",
            variable,
            flags.len(),
            series.len(),
            mean,
            std
        );

        AnomalyOutcome::Detected {
            variable,
            mean,
            std,
            threshold: self.threshold,
            flags,
        }
    }
}
