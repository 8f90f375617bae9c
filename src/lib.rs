pub mod config;
pub mod error;
pub mod frame;
pub mod io;
pub mod ml;
pub mod na;
pub mod pipeline;
pub mod pivot;
pub mod stats;
pub mod store;
pub mod temporal;
pub mod time_series;

// Re-export commonly used types
pub use config::{AppConfig, DashboardConfig, StoreConfig};
pub use error::{Error, Result};
pub use frame::{DenseSeries, WideSeries};
pub use ml::{AnomalyFlag, AnomalyOutcome, ZScoreDetector};
pub use na::NA;
pub use pipeline::{analyze, DashboardReport, Kpi, Pipeline, RunOutcome, VariableReport};
pub use pivot::PivotTable;
pub use store::{
    CachedStore, InMemoryStore, InfluxStore, RawSample, SampleQuery, SampleStore, SensorKind,
};
pub use temporal::{ResampleInterval, Resampler, TrailingWindow};
pub use time_series::{ForecastOutcome, ForecastPoint, LinearTrendForecaster, TrendForecast};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
