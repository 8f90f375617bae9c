//! Sample fixtures
//!
//! All timestamps are anchored on a fixed UTC instant so results do not
//! depend on the wall clock.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sensorscope::{InMemoryStore, RawSample};

pub const DHT22_MEASUREMENT: &str = "studio-dht22";
pub const MPU6050_MEASUREMENT: &str = "mpu6050";

/// First sample instant of every fixture (minute aligned)
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()
}

/// Reference "now" for in-memory stores: one day after `t0`
pub fn reference_now() -> DateTime<Utc> {
    t0() + Duration::days(1)
}

/// `count` samples of `value = slope * elapsed_seconds + intercept`, one per `step_secs`
pub fn linear_samples(
    variable: &str,
    count: usize,
    step_secs: i64,
    slope: f64,
    intercept: f64,
) -> Vec<RawSample> {
    (0..count)
        .map(|i| {
            let elapsed = i as i64 * step_secs;
            RawSample::new(
                t0() + Duration::seconds(elapsed),
                variable,
                slope * elapsed as f64 + intercept,
            )
        })
        .collect()
}

/// `count` samples of a constant reading, one per minute
pub fn constant_samples(variable: &str, count: usize, value: f64) -> Vec<RawSample> {
    linear_samples(variable, count, 60, 0.0, value)
}

/// Accelerometer axes forming a 3-4-12 triangle (magnitude 13) plus a gyro axis
pub fn mpu6050_samples(count: usize) -> Vec<RawSample> {
    let mut samples = Vec::with_capacity(count * 4);
    for i in 0..count {
        let ts = t0() + Duration::seconds(i as i64 * 60);
        samples.push(RawSample::new(ts, "accel_x", 3.0));
        samples.push(RawSample::new(ts, "accel_y", 4.0));
        samples.push(RawSample::new(ts, "accel_z", 12.0));
        samples.push(RawSample::new(ts, "gyro_x", (i % 5) as f64));
    }
    samples
}

/// DHT22 store with a slowly rising temperature and a noisy humidity
pub fn dht22_store(count: usize) -> InMemoryStore {
    let temperature = linear_samples("temperature", count, 60, 0.001, 20.0);
    let humidity = (0..count).map(|i| {
        RawSample::new(
            t0() + Duration::seconds(i as i64 * 60),
            "humidity",
            45.0 + if i % 2 == 0 { 0.5 } else { -0.5 },
        )
    });
    InMemoryStore::new(reference_now())
        .with_samples(DHT22_MEASUREMENT, temperature)
        .with_samples(DHT22_MEASUREMENT, humidity)
}
