//! Sample stores.
//!
//! A store answers one question: the raw long-form samples of a measurement
//! and field set over a lookback window. Everything downstream is computed
//! from that answer.

pub mod cache;
pub mod influx;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};

pub use cache::CachedStore;
pub use influx::{build_flux_query, parse_annotated_csv, InfluxStore};
pub use memory::InMemoryStore;

/// Shortest lookback accepted, in days
pub const MIN_LOOKBACK_DAYS: u32 = 1;
/// Longest lookback accepted, in days
pub const MAX_LOOKBACK_DAYS: u32 = 30;

/// One long-form reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawSample {
    /// Instant of the reading, normalised to UTC
    pub timestamp: DateTime<Utc>,
    /// Field name
    pub variable: String,
    /// Reading
    pub value: f64,
}

impl RawSample {
    /// Create a sample
    pub fn new(timestamp: DateTime<Utc>, variable: impl Into<String>, value: f64) -> Self {
        RawSample {
            timestamp,
            variable: variable.into(),
            value,
        }
    }
}

/// Sensor families with a known measurement and field set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Temperature and humidity
    #[serde(rename = "DHT22")]
    Dht22,
    /// Accelerometer and gyroscope
    #[serde(rename = "MPU6050")]
    Mpu6050,
}

impl SensorKind {
    /// Measurement the sensor writes to
    pub fn measurement(&self) -> &'static str {
        match self {
            SensorKind::Dht22 => "studio-dht22",
            SensorKind::Mpu6050 => "mpu6050",
        }
    }

    /// Fields queried for the sensor
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            SensorKind::Dht22 => &["humidity", "temperature", "heat_index"],
            SensorKind::Mpu6050 => &[
                "accel_x",
                "accel_y",
                "accel_z",
                "gyro_x",
                "gyro_y",
                "gyro_z",
                "temperature",
            ],
        }
    }
}

impl Default for SensorKind {
    fn default() -> Self {
        SensorKind::Dht22
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Dht22 => write!(f, "DHT22"),
            SensorKind::Mpu6050 => write!(f, "MPU6050"),
        }
    }
}

impl FromStr for SensorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "DHT22" => Ok(SensorKind::Dht22),
            "MPU6050" => Ok(SensorKind::Mpu6050),
            _ => Err(Error::Config(format!(
                "unknown sensor '{}', expected DHT22 or MPU6050",
                s
            ))),
        }
    }
}

/// Query parameters; also the fetch cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleQuery {
    measurement: String,
    fields: BTreeSet<String>,
    lookback_days: u32,
}

impl SampleQuery {
    /// Create a query, validating the lookback range
    pub fn new<I, S>(measurement: impl Into<String>, fields: I, lookback_days: u32) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            return Err(Error::InvalidInput(format!(
                "lookback of {} days is outside {}..={}",
                lookback_days, MIN_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS
            )));
        }
        let fields: BTreeSet<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(Error::InvalidInput("a query needs at least one field".into()));
        }
        Ok(SampleQuery {
            measurement: measurement.into(),
            fields,
            lookback_days,
        })
    }

    /// Query for a sensor's measurement and field set
    pub fn for_sensor(sensor: SensorKind, lookback_days: u32) -> Result<Self> {
        Self::new(
            sensor.measurement(),
            sensor.fields().iter().copied(),
            lookback_days,
        )
    }

    /// Measurement name
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Field names, sorted
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Lookback window in days
    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }
}

impl fmt::Display for SampleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        write!(
            f,
            "{}[{}] over {}d",
            self.measurement,
            fields.join(","),
            self.lookback_days
        )
    }
}

/// Source of raw samples.
///
/// Fails with `Error::StoreConnection` when the backend is unreachable or
/// rejects the credentials, and `Error::StoreQuery` when the query fails.
pub trait SampleStore: Send + Sync {
    /// Fetch every sample matching `query`, in any order
    fn fetch(&self, query: &SampleQuery) -> Result<Vec<RawSample>>;
}

impl<S: SampleStore + ?Sized> SampleStore for Arc<S> {
    fn fetch(&self, query: &SampleQuery) -> Result<Vec<RawSample>> {
        (**self).fetch(query)
    }
}

impl<S: SampleStore + ?Sized> SampleStore for Box<S> {
    fn fetch(&self, query: &SampleQuery) -> Result<Vec<RawSample>> {
        (**self).fetch(query)
    }
}
