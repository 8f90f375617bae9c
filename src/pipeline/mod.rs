//! Dashboard pipeline.
//!
//! One run is FETCH -> VALIDATE-NONEMPTY -> PIVOT+RESAMPLE -> VALIDATE-HAS-COLUMN
//! -> per variable {SMOOTH, ANOMALY, FORECAST}. Runs keep no state between
//! them; the store (usually a `CachedStore`) decides whether a fetch is reused.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::ops::ControlFlow;
use std::time::Duration;

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::frame::{add_derived_features, analyzable_columns, WideSeries};
use crate::ml::{AnomalyOutcome, ZScoreDetector};
use crate::na::NA;
use crate::pivot::PivotTable;
use crate::stats::{self, DescriptiveStats};
use crate::store::{RawSample, SampleQuery, SampleStore};
use crate::temporal::{parse_timezone, ResampleInterval, Resampler, TrailingWindow};
use crate::time_series::{ForecastOutcome, LinearTrendForecaster};

/// Number of variables summarised as KPIs
pub const KPI_COUNT: usize = 4;

/// Rows shown by table previews
pub const PREVIEW_ROWS: usize = 500;

/// Latest value of a variable and its change since the previous bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    /// Column the KPI summarises
    pub variable: String,
    /// Bucket of the latest retained value
    pub timestamp: Option<DateTime<Tz>>,
    /// Latest retained value
    pub last: Option<f64>,
    /// `last` minus the previous retained value; 0 with a single value
    pub delta: Option<f64>,
}

impl Kpi {
    fn from_column(frame: &WideSeries, variable: &str) -> Option<Kpi> {
        let values = frame.column(variable)?;
        let mut retained = frame
            .index()
            .iter()
            .zip(values)
            .filter_map(|(ts, v)| v.get().map(|v| (*ts, v)))
            .rev();

        let kpi = match retained.next() {
            Some((timestamp, last)) => {
                let previous = retained.next().map_or(last, |(_, v)| v);
                Kpi {
                    variable: variable.to_string(),
                    timestamp: Some(timestamp),
                    last: Some(last),
                    delta: Some(last - previous),
                }
            }
            None => Kpi {
                variable: variable.to_string(),
                timestamp: None,
                last: None,
                delta: None,
            },
        };
        Some(kpi)
    }
}

impl fmt::Display for Kpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.last, self.delta) {
            (Some(last), Some(delta)) => {
                write!(f, "{}: {:.2} (\u{394} {:+.2})", self.variable, last, delta)
            }
            _ => write!(f, "{}: -", self.variable),
        }
    }
}

/// Analytics of one selected variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableReport {
    pub name: String,
    /// Summary of the retained values; `None` when every bucket is missing
    pub summary: Option<DescriptiveStats>,
    /// Trailing moving average, aligned with the table index
    pub smoothed: Vec<NA<f64>>,
    pub anomalies: AnomalyOutcome,
    pub forecast: ForecastOutcome,
}

/// Everything a successful run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    /// Resampled table, derived columns included
    #[serde(skip)]
    pub series: WideSeries,
    pub interval: ResampleInterval,
    pub rows: usize,
    pub analyzable: Vec<String>,
    pub kpis: Vec<Kpi>,
    pub variables: Vec<VariableReport>,
}

impl DashboardReport {
    /// Report of the named variable, if it was selected
    pub fn variable(&self, name: &str) -> Option<&VariableReport> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Last `PREVIEW_ROWS` rows of the table
    pub fn preview(&self) -> WideSeries {
        self.series.tail(PREVIEW_ROWS)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The store returned no samples for the window
    EmptyResult {
        measurement: String,
        lookback_days: u32,
    },
    /// Resampling left no usable numeric column
    NoAnalyzableColumn { measurement: String },
    /// Analytics ran
    Success(DashboardReport),
}

impl RunOutcome {
    /// The report of a successful run
    pub fn report(&self) -> Option<&DashboardReport> {
        match self {
            RunOutcome::Success(report) => Some(report),
            _ => None,
        }
    }

    /// Whether the run produced a report
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::EmptyResult {
                measurement,
                lookback_days,
            } => write!(
                f,
                "{}: no samples in the last {} days; widen the lookback window",
                measurement, lookback_days
            ),
            RunOutcome::NoAnalyzableColumn { measurement } => write!(
                f,
                "{}: no numeric variable left after resampling",
                measurement
            ),
            RunOutcome::Success(report) => write!(
                f,
                "{} rows at {}, {} analyzable variables, {} analysed",
                report.rows,
                report.interval,
                report.analyzable.len(),
                report.variables.len()
            ),
        }
    }
}

/// Resolve the variables to analyse.
///
/// Unknown names are skipped with a warning. An empty request, or one with
/// no known name, selects the first analyzable column.
pub fn select_variables(analyzable: &[String], requested: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for name in requested {
        if !analyzable.contains(name) {
            log::warn!("{}: not an analyzable variable, skipped", name);
        } else if !selected.contains(name) {
            selected.push(name.clone());
        }
    }
    if selected.is_empty() {
        selected.extend(analyzable.first().cloned());
    }
    selected
}

/// Run every stage after the fetch on `samples`
pub fn analyze(
    samples: &[RawSample],
    measurement: &str,
    config: &DashboardConfig,
    timezone: Tz,
) -> Result<RunOutcome> {
    if samples.is_empty() {
        log::warn!(
            "{}: no samples in the last {} days",
            measurement,
            config.lookback_days
        );
        return Ok(RunOutcome::EmptyResult {
            measurement: measurement.to_string(),
            lookback_days: config.lookback_days,
        });
    }

    let table = PivotTable::from_samples(samples)?;
    let mut series = Resampler::new(config.interval, timezone).mean(&table)?;
    add_derived_features(&mut series)?;
    log::debug!(
        "{}: {} samples -> {} rows at {}",
        measurement,
        samples.len(),
        series.len(),
        config.interval
    );

    let analyzable = analyzable_columns(&series);
    if analyzable.is_empty() {
        log::warn!("{}: no numeric variable left after resampling", measurement);
        return Ok(RunOutcome::NoAnalyzableColumn {
            measurement: measurement.to_string(),
        });
    }

    let kpis = analyzable
        .iter()
        .take(KPI_COUNT)
        .filter_map(|name| Kpi::from_column(&series, name))
        .collect();

    let window = TrailingWindow::new(config.ma_window)?;
    let detector = ZScoreDetector::new(config.z_threshold)?;
    let forecaster = LinearTrendForecaster::new(config.horizon_minutes, config.interval);

    let mut variables = Vec::new();
    for name in select_variables(&analyzable, &config.selected_variables) {
        let smoothed = match series.column(&name) {
            Some(values) => window.mean(values),
            None => continue,
        };
        let dense = series.dropna(&name)?;
        let summary = stats::describe(dense.values()).ok();
        let anomalies = detector.detect(&dense);
        let forecast = forecaster.forecast(&dense)?;
        variables.push(VariableReport {
            name,
            summary,
            smoothed,
            anomalies,
            forecast,
        });
    }

    Ok(RunOutcome::Success(DashboardReport {
        rows: series.len(),
        interval: config.interval,
        series,
        analyzable,
        kpis,
        variables,
    }))
}

/// Fetches samples for the configured sensor and runs the analytics
#[derive(Debug)]
pub struct Pipeline<S> {
    store: S,
    config: DashboardConfig,
    timezone: Tz,
    refresh_interval: Duration,
}

impl<S: SampleStore> Pipeline<S> {
    /// Create a pipeline; the configuration is validated first
    pub fn new(store: S, config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let timezone = parse_timezone(&config.display_timezone)?;
        let refresh_interval = Duration::from_secs(config.refresh_secs);
        Ok(Pipeline {
            store,
            config,
            timezone,
            refresh_interval,
        })
    }

    /// Override the wait between auto-refresh runs
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Validated dashboard settings
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Underlying sample store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Timezone the index is displayed in
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The query issued on every run
    pub fn query(&self) -> Result<SampleQuery> {
        SampleQuery::for_sensor(self.config.sensor, self.config.lookback_days)
    }

    /// Run the pipeline once.
    ///
    /// Store failures are returned as errors and end the run; empty and
    /// column-less results are reported as outcomes.
    pub fn run(&self) -> Result<RunOutcome> {
        let query = self.query()?;
        let samples = self.store.fetch(&query).map_err(|e| {
            log::error!("fetch for {} failed: {}", query, e);
            e
        })?;
        analyze(&samples, query.measurement(), &self.config, self.timezone)
    }

    /// Run once, then keep rerunning while auto-refresh is on.
    ///
    /// `on_run` sees every outcome and can stop the loop with
    /// `ControlFlow::Break`. Each wait blocks the calling thread. A fatal
    /// error stops the loop and is returned; otherwise the last outcome is.
    pub fn run_loop<F>(&self, mut on_run: F) -> Result<RunOutcome>
    where
        F: FnMut(&RunOutcome) -> ControlFlow<()>,
    {
        loop {
            let outcome = self.run()?;
            if on_run(&outcome).is_break() || !self.config.auto_refresh {
                return Ok(outcome);
            }
            log::debug!("next refresh in {:?}", self.refresh_interval);
            std::thread::sleep(self.refresh_interval);
        }
    }
}
