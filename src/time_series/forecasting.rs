//! Baseline linear trend forecaster.
//!
//! Fits `value = a + b * elapsed_seconds` over the retained points of one
//! variable and extrapolates at the resample cadence.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};
use crate::frame::DenseSeries;
use crate::stats;
use crate::temporal::ResampleInterval;

/// Fewest retained points a trend is fitted on
pub const MIN_FORECAST_POINTS: usize = 10;

/// One fitted or extrapolated value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    /// Timestamp of the point
    pub timestamp: DateTime<Tz>,
    /// Value on the fitted line
    pub predicted_value: f64,
}

/// Fitted trend with its in-sample values and extrapolation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendForecast {
    /// Variable name
    pub variable: String,
    /// Value at the first retained timestamp
    pub intercept: f64,
    /// Change per second
    pub slope_per_second: f64,
    /// Coefficient of determination of the fit
    pub r_squared: f64,
    /// Fitted values at every retained timestamp
    pub fitted: Vec<ForecastPoint>,
    /// Extrapolated values after the last retained timestamp
    pub forecast: Vec<ForecastPoint>,
}

/// Outcome of forecasting one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    /// Too few retained points to fit a trend
    InsufficientData {
        /// Variable name
        variable: String,
        /// Retained points available
        points: usize,
    },
    /// Trend fitted
    Forecast(TrendForecast),
}

impl ForecastOutcome {
    /// The fitted trend, if one was produced
    pub fn trend(&self) -> Option<&TrendForecast> {
        match self {
            ForecastOutcome::Forecast(trend) => Some(trend),
            ForecastOutcome::InsufficientData { .. } => None,
        }
    }
}

impl fmt::Display for ForecastOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastOutcome::InsufficientData { variable, points } => write!(
                f,
                "{}: at least {} points are required to fit a trend (have {})",
                variable, MIN_FORECAST_POINTS, points
            ),
            ForecastOutcome::Forecast(trend) => write!(
                f,
                "{}: slope {:+.6}/s, {} points forecast",
                trend.variable,
                trend.slope_per_second,
                trend.forecast.len()
            ),
        }
    }
}

/// Least-squares trend extrapolated over a fixed horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearTrendForecaster {
    horizon_minutes: u32,
    step_seconds: i64,
}

impl LinearTrendForecaster {
    /// Forecast `horizon_minutes` ahead at the resample cadence
    pub fn new(horizon_minutes: u32, interval: ResampleInterval) -> Self {
        Self::with_step_seconds(horizon_minutes, interval.to_seconds())
    }

    /// Forecast at an explicit cadence; non-positive steps are floored to 1s
    pub fn with_step_seconds(horizon_minutes: u32, step_seconds: i64) -> Self {
        LinearTrendForecaster {
            horizon_minutes,
            step_seconds: step_seconds.max(1),
        }
    }

    /// Spacing of forecast points in seconds
    pub fn step_seconds(&self) -> i64 {
        self.step_seconds
    }

    /// Number of forecast points: floor(horizon seconds / step seconds)
    pub fn steps(&self) -> usize {
        (i64::from(self.horizon_minutes) * 60 / self.step_seconds) as usize
    }

    /// Fit and extrapolate one variable
    pub fn forecast(&self, series: &DenseSeries) -> Result<ForecastOutcome> {
        let variable = series.name().to_string();
        if series.len() < MIN_FORECAST_POINTS {
            log::info!(
                "{}: {} points retained, at least {} required for regression",
                variable,
                series.len(),
                MIN_FORECAST_POINTS
            );
            return Ok(ForecastOutcome::InsufficientData {
                variable,
                points: series.len(),
            });
        }

        let timestamps = series.timestamps();
        let (origin, last) = match (timestamps.first(), timestamps.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(Error::EmptyData(format!("{}: no retained points", variable))),
        };

        let elapsed: Vec<f64> = timestamps
            .iter()
            .map(|ts| elapsed_seconds(&origin, ts))
            .collect();
        let fit = stats::linear_regression(&elapsed, series.values())?;

        let fitted = timestamps
            .iter()
            .zip(&fit.fitted_values)
            .map(|(ts, value)| ForecastPoint {
                timestamp: *ts,
                predicted_value: *value,
            })
            .collect();

        let forecast = (1..=self.steps() as i64)
            .map(|i| {
                let timestamp = last + Duration::seconds(i * self.step_seconds);
                ForecastPoint {
                    timestamp,
                    predicted_value: fit.predict(elapsed_seconds(&origin, &timestamp)),
                }
            })
            .collect();

        Ok(ForecastOutcome::Forecast(TrendForecast {
            variable,
            intercept: fit.intercept,
            slope_per_second: fit.slope,
            r_squared: fit.r_squared,
            fitted,
            forecast,
        }))
    }
}

fn elapsed_seconds(origin: &DateTime<Tz>, ts: &DateTime<Tz>) -> f64 {
    (*ts - *origin).num_milliseconds() as f64 / 1000.0
}
