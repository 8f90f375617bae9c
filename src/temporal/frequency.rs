use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Resample cadence of the wide table.
///
/// Only the cadences offered by the dashboard are representable; each one
/// divides a day evenly, so buckets can be floored on epoch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResampleInterval {
    /// 1 second
    OneSecond,
    /// 5 seconds
    FiveSeconds,
    /// 10 seconds
    TenSeconds,
    /// 30 seconds
    ThirtySeconds,
    /// 1 minute
    OneMinute,
    /// 5 minutes
    FiveMinutes,
}

impl ResampleInterval {
    /// Every supported cadence, shortest first
    pub const ALL: [ResampleInterval; 6] = [
        ResampleInterval::OneSecond,
        ResampleInterval::FiveSeconds,
        ResampleInterval::TenSeconds,
        ResampleInterval::ThirtySeconds,
        ResampleInterval::OneMinute,
        ResampleInterval::FiveMinutes,
    ];

    /// Bucket width in seconds
    pub fn to_seconds(&self) -> i64 {
        match self {
            ResampleInterval::OneSecond => 1,
            ResampleInterval::FiveSeconds => 5,
            ResampleInterval::TenSeconds => 10,
            ResampleInterval::ThirtySeconds => 30,
            ResampleInterval::OneMinute => 60,
            ResampleInterval::FiveMinutes => 300,
        }
    }

    /// Bucket width in milliseconds
    pub fn to_millis(&self) -> i64 {
        self.to_seconds() * 1000
    }

    /// Bucket width as a chrono duration
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.to_seconds())
    }

    /// Compact rule string ("1s", "5min", ...)
    pub fn rule(&self) -> &'static str {
        match self {
            ResampleInterval::OneSecond => "1s",
            ResampleInterval::FiveSeconds => "5s",
            ResampleInterval::TenSeconds => "10s",
            ResampleInterval::ThirtySeconds => "30s",
            ResampleInterval::OneMinute => "1min",
            ResampleInterval::FiveMinutes => "5min",
        }
    }
}

impl Default for ResampleInterval {
    fn default() -> Self {
        ResampleInterval::OneMinute
    }
}

impl fmt::Display for ResampleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule())
    }
}

impl FromStr for ResampleInterval {
    type Err = Error;

    /// Accepts the compact rules as well as the spaced labels ("1 s", "1 min").
    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match compact.as_str() {
            "1s" | "1sec" => Ok(ResampleInterval::OneSecond),
            "5s" | "5sec" => Ok(ResampleInterval::FiveSeconds),
            "10s" | "10sec" => Ok(ResampleInterval::TenSeconds),
            "30s" | "30sec" => Ok(ResampleInterval::ThirtySeconds),
            "1min" | "60s" => Ok(ResampleInterval::OneMinute),
            "5min" | "300s" => Ok(ResampleInterval::FiveMinutes),
            _ => Err(Error::Config(format!(
                "unsupported resample interval '{}', expected one of 1s, 5s, 10s, 30s, 1min, 5min",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ResampleInterval {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ResampleInterval> for String {
    fn from(value: ResampleInterval) -> Self {
        value.rule().to_string()
    }
}
