//! Statistical detectors run over resampled telemetry.

pub mod anomaly_detection;

pub use anomaly_detection::{AnomalyFlag, AnomalyOutcome, ZScoreDetector};
