//! Pipeline Benchmarks
//!
//! Pivot/resample, the per-variable analytics and a full run over an
//! in-memory store, at a few raw-sample volumes.

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sensorscope::{
    analyze, DashboardConfig, InMemoryStore, LinearTrendForecaster, Pipeline, PivotTable,
    RawSample, ResampleInterval, Resampler, TrailingWindow, ZScoreDetector,
};
use std::hint::black_box;

const FIELDS: [&str; 3] = ["humidity", "temperature", "heat_index"];

/// Readings every 2 seconds for each field, with a little jitter
fn create_samples(n_per_field: usize) -> Vec<RawSample> {
    let start = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();

    // Simple LCG random generator for reproducibility
    let mut rng_state: u64 = 42;
    let mut rand_f64 = || -> f64 {
        rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (rng_state >> 33) as f64 / (u32::MAX as f64)
    };

    let mut samples = Vec::with_capacity(n_per_field * FIELDS.len());
    for i in 0..n_per_field {
        let ts = start + Duration::seconds(i as i64 * 2);
        for (f, field) in FIELDS.iter().enumerate() {
            let base = 20.0 + 10.0 * f as f64;
            samples.push(RawSample::new(ts, *field, base + rand_f64()));
        }
    }
    samples
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    for &n in &[1_000usize, 10_000, 100_000] {
        let samples = create_samples(n);
        group.bench_with_input(BenchmarkId::new("pivot_and_mean_1min", n), &samples, |b, s| {
            b.iter(|| {
                let table = PivotTable::from_samples(black_box(s)).unwrap();
                Resampler::new(ResampleInterval::OneMinute, chrono_tz::UTC)
                    .mean(&table)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_analytics(c: &mut Criterion) {
    let samples = create_samples(100_000);
    let table = PivotTable::from_samples(&samples).unwrap();
    let wide = Resampler::new(ResampleInterval::TenSeconds, chrono_tz::UTC)
        .mean(&table)
        .unwrap();
    let column = wide.column("temperature").unwrap().to_vec();
    let dense = wide.dropna("temperature").unwrap();

    let mut group = c.benchmark_group("analytics");
    group.bench_function("moving_average_w50", |b| {
        let window = TrailingWindow::new(50).unwrap();
        b.iter(|| window.mean(black_box(&column)))
    });
    group.bench_function("zscore", |b| {
        let detector = ZScoreDetector::new(2.5).unwrap();
        b.iter(|| detector.detect(black_box(&dense)))
    });
    group.bench_function("linear_forecast_120min", |b| {
        let forecaster = LinearTrendForecaster::new(120, ResampleInterval::TenSeconds);
        b.iter(|| forecaster.forecast(black_box(&dense)).unwrap())
    });
    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let samples = create_samples(50_000);
    let config = DashboardConfig {
        selected_variables: FIELDS.iter().map(|f| f.to_string()).collect(),
        display_timezone: "UTC".into(),
        ..DashboardConfig::default()
    };

    let mut group = c.benchmark_group("pipeline");
    group.bench_function("analyze_50k", |b| {
        b.iter(|| analyze(black_box(&samples), "studio-dht22", &config, chrono_tz::UTC).unwrap())
    });

    let now = samples.last().map(|s| s.timestamp).unwrap();
    let store = InMemoryStore::new(now).with_samples("studio-dht22", samples.clone());
    let pipeline = Pipeline::new(store, config.clone()).unwrap();
    group.bench_function("run_in_memory_50k", |b| b.iter(|| pipeline.run().unwrap()));
    group.finish();
}

criterion_group!(benches, bench_resample, bench_analytics, bench_full_run);
criterion_main!(benches);
