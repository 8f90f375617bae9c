use clap::Parser;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use sensorscope::io::{write_csv_file, DEFAULT_EXPORT_FILE};
use sensorscope::{
    AppConfig, CachedStore, DashboardConfig, DashboardReport, Error, InfluxStore, Pipeline,
    ResampleInterval, Result, RunOutcome, SensorKind,
};

/// Resample sensor telemetry, flag anomalies and forecast trends
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file with [store] and [dashboard] tables
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sensor to query (DHT22 or MPU6050)
    #[arg(long)]
    sensor: Option<SensorKind>,

    /// Days of history to fetch (1-30)
    #[arg(long, value_name = "DAYS")]
    days: Option<u32>,

    /// Resample interval (1s, 5s, 10s, 30s, 1min, 5min)
    #[arg(long)]
    interval: Option<ResampleInterval>,

    /// Moving-average window in points (1-50)
    #[arg(long)]
    window: Option<usize>,

    /// Z-score threshold (1.0-5.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// Forecast horizon in minutes (5-120, step 5)
    #[arg(long, value_name = "MINUTES")]
    horizon: Option<u32>,

    /// Variable to analyse; repeat for several
    #[arg(long = "variable", value_name = "NAME")]
    variables: Vec<String>,

    /// Display timezone (IANA name)
    #[arg(long, value_name = "TZ")]
    timezone: Option<String>,

    /// Write the resampled table as CSV
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = DEFAULT_EXPORT_FILE)]
    export: Option<PathBuf>,

    /// Rerun every refresh interval until interrupted
    #[arg(long)]
    auto_refresh: bool,

    /// Print outcomes as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(sensor) = self.sensor {
            config.sensor = sensor;
        }
        if let Some(days) = self.days {
            config.lookback_days = days;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(window) = self.window {
            config.ma_window = window;
        }
        if let Some(threshold) = self.threshold {
            config.z_threshold = threshold;
        }
        if let Some(horizon) = self.horizon {
            config.horizon_minutes = horizon;
        }
        if !self.variables.is_empty() {
            config.selected_variables = self.variables.clone();
        }
        if let Some(timezone) = &self.timezone {
            config.display_timezone = timezone.clone();
        }
        if self.auto_refresh {
            config.auto_refresh = true;
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_store_failure() => {
            eprintln!("error: sensor data unavailable: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let app = AppConfig::load(args.config.as_deref())?;
    let mut dashboard = app.dashboard.clone();
    args.apply(&mut dashboard);
    dashboard.validate()?;

    let store = CachedStore::with_policy(
        InfluxStore::new(app.store_config()?)?,
        Duration::from_secs(dashboard.cache_ttl_secs),
        dashboard.cache_capacity,
    );
    let sensor = dashboard.sensor;
    let pipeline = Pipeline::new(store, dashboard)?;

    let mut failure: Option<Error> = None;
    pipeline.run_loop(|outcome| {
        match render(sensor, outcome, args.json, args.export.as_deref()) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        }
    })?;

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn render(sensor: SensorKind, outcome: &RunOutcome, json: bool, export: Option<&Path>) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        match outcome {
            RunOutcome::Success(report) => print_report(sensor, report),
            other => println!("warning: {}", other),
        }
    }

    if let (Some(path), Some(report)) = (export, outcome.report()) {
        write_csv_file(&report.series, path)?;
    }
    Ok(())
}

fn print_report(sensor: SensorKind, report: &DashboardReport) {
    println!(
        "== {} ({}): {} rows at {} ==",
        sensor,
        sensor.measurement(),
        report.rows,
        report.interval
    );
    let kpis: Vec<String> = report.kpis.iter().map(ToString::to_string).collect();
    println!("KPIs: {}", kpis.join(" | "));

    for variable in &report.variables {
        println!();
        println!("[{}]", variable.name);
        if let Some(summary) = &variable.summary {
            println!(
                "  n={} mean={:.3} std={:.3} min={:.3} max={:.3}",
                summary.count, summary.mean, summary.std, summary.min, summary.max
            );
        }
        if let Some(latest) = variable.smoothed.iter().rev().find_map(|v| v.get()) {
            println!("  moving average (latest): {:.3}", latest);
        }

        println!("  {}", variable.anomalies);
        for flag in variable.anomalies.flags() {
            println!(
                "    {}  {:.3}  z={:+.2}",
                flag.timestamp.format("%Y-%m-%d %H:%M:%S %Z"),
                flag.value,
                flag.score
            );
        }

        println!("  {}", variable.forecast);
        if let Some(last) = variable.forecast.trend().and_then(|t| t.forecast.last()) {
            println!(
                "    {}  {:.3}",
                last.timestamp.format("%Y-%m-%d %H:%M:%S %Z"),
                last.predicted_value
            );
        }
    }
}
