//! Time Series Forecasting Module
//!
//! Only a baseline linear trend is provided; it is meant to show the
//! direction of a signal over a short horizon, not to model seasonality.

pub mod forecasting;

pub use forecasting::{
    ForecastOutcome, ForecastPoint, LinearTrendForecaster, TrendForecast, MIN_FORECAST_POINTS,
};
