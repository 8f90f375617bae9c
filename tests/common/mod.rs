//! Common test utilities module
//!
//! Provides shared fixtures for tests:
//! - Raw sample generators for both sensor families
//! - In-memory stores anchored at a fixed instant

pub mod fixtures;

pub use fixtures::{
    constant_samples, dht22_store, linear_samples, mpu6050_samples, reference_now, t0,
    DHT22_MEASUREMENT, MPU6050_MEASUREMENT,
};
