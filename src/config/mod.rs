//! Runtime configuration.
//!
//! Connection details for the sample store and the dashboard options are
//! read from a TOML file (`[store]` and `[dashboard]` tables), with the
//! `INFLUXDB_*` environment variables taking precedence over the file for
//! the store. Nothing about the backend is compiled in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{Error, Result};
use crate::ml::anomaly_detection::{MAX_THRESHOLD, MIN_THRESHOLD};
use crate::store::{SensorKind, MAX_LOOKBACK_DAYS, MIN_LOOKBACK_DAYS};
use crate::temporal::{parse_timezone, ResampleInterval, DEFAULT_DISPLAY_TIMEZONE, MAX_WINDOW};

/// Environment variable holding the store URL
pub const ENV_URL: &str = "INFLUXDB_URL";
/// Environment variable holding the API token
pub const ENV_TOKEN: &str = "INFLUXDB_TOKEN";
/// Environment variable holding the organisation
pub const ENV_ORG: &str = "INFLUXDB_ORG";
/// Environment variable holding the bucket
pub const ENV_BUCKET: &str = "INFLUXDB_BUCKET";
/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT: &str = "INFLUXDB_TIMEOUT_SECS";

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shortest forecast horizon, in minutes
pub const MIN_HORIZON_MINUTES: u32 = 5;
/// Longest forecast horizon, in minutes
pub const MAX_HORIZON_MINUTES: u32 = 120;
/// Forecast horizons are whole multiples of this many minutes
pub const HORIZON_STEP_MINUTES: u32 = 5;

/// Connection settings of the sample store
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the server
    pub url: String,
    /// API token
    pub token: String,
    /// Organisation the bucket belongs to
    pub org: String,
    /// Bucket holding the measurements
    pub bucket: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Settings with the default timeout
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        StoreConfig {
            url: url.into(),
            token: token.into(),
            org: org.into(),
            bucket: bucket.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Settings taken from the process environment alone
    pub fn from_env() -> Result<Self> {
        Self::resolve(&StoreSection::default(), |key| std::env::var(key).ok())
    }

    /// Merge a file section with variables from `lookup`; variables win.
    pub fn resolve<F>(file: &StoreSection, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: &Option<String>| -> Option<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| fallback.clone())
        };
        let required = |key: &str, fallback: &Option<String>, option: &str| -> Result<String> {
            pick(key, fallback).ok_or_else(|| {
                Error::Config(format!(
                    "missing store {}: set {} or store.{} in the config file",
                    option, key, option
                ))
            })
        };

        let timeout_secs = match lookup(ENV_TIMEOUT).filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT, raw))
            })?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let config = StoreConfig {
            url: required(ENV_URL, &file.url, "url")?,
            token: required(ENV_TOKEN, &file.token, "token")?,
            org: required(ENV_ORG, &file.org, "org")?,
            bucket: required(ENV_BUCKET, &file.bucket, "bucket")?,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the URL scheme and the timeout
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "store url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("store timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// `[store]` table of the config file; every key is optional
#[derive(Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub url: Option<String>,
    pub token: Option<String>,
    pub org: Option<String>,
    pub bucket: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for StoreSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSection")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Dashboard options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Sensor family to query
    pub sensor: SensorKind,
    /// Days of history to fetch
    pub lookback_days: u32,
    /// Resample bucket width
    pub interval: ResampleInterval,
    /// Moving-average window, in points
    pub ma_window: usize,
    /// Z-score threshold above which a point is flagged
    pub z_threshold: f64,
    /// Forecast horizon, in minutes
    pub horizon_minutes: u32,
    /// Rerun the pipeline every `refresh_secs`
    pub auto_refresh: bool,
    pub refresh_secs: u64,
    /// Lifetime of a cached fetch
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    /// IANA name of the timezone the index is shown in
    pub display_timezone: String,
    /// Variables to analyse; empty means the first analyzable one
    pub selected_variables: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            sensor: SensorKind::Dht22,
            lookback_days: 3,
            interval: ResampleInterval::OneMinute,
            ma_window: 5,
            z_threshold: 2.5,
            horizon_minutes: 30,
            auto_refresh: false,
            refresh_secs: 60,
            cache_ttl_secs: 60,
            cache_capacity: 32,
            display_timezone: DEFAULT_DISPLAY_TIMEZONE.to_string(),
            selected_variables: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Check every option against its allowed range
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(Error::Config(format!(
                "lookback_days must be within {}..={}, got {}",
                MIN_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        if !(1..=MAX_WINDOW).contains(&self.ma_window) {
            return Err(Error::Config(format!(
                "ma_window must be within 1..={}, got {}",
                MAX_WINDOW, self.ma_window
            )));
        }
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&self.z_threshold) {
            return Err(Error::Config(format!(
                "z_threshold must be within {:.1}..={:.1}, got {}",
                MIN_THRESHOLD, MAX_THRESHOLD, self.z_threshold
            )));
        }
        let tenths = self.z_threshold * 10.0;
        if (tenths - tenths.round()).abs() > 1e-9 {
            return Err(Error::Config(format!(
                "z_threshold must be a multiple of 0.1, got {}",
                self.z_threshold
            )));
        }
        if !(MIN_HORIZON_MINUTES..=MAX_HORIZON_MINUTES).contains(&self.horizon_minutes)
            || self.horizon_minutes % HORIZON_STEP_MINUTES != 0
        {
            return Err(Error::Config(format!(
                "horizon_minutes must be a multiple of {} within {}..={}, got {}",
                HORIZON_STEP_MINUTES, MIN_HORIZON_MINUTES, MAX_HORIZON_MINUTES, self.horizon_minutes
            )));
        }
        if self.refresh_secs == 0 {
            return Err(Error::Config("refresh_secs must be positive".into()));
        }
        if self.cache_ttl_secs == 0 {
            return Err(Error::Config("cache_ttl_secs must be positive".into()));
        }
        if self.cache_capacity == 0 {
            return Err(Error::Config("cache_capacity must be positive".into()));
        }
        parse_timezone(&self.display_timezone)
            .map_err(|e| Error::Config(format!("display_timezone: {}", e)))?;
        Ok(())
    }
}

/// Contents of a config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub store: StoreSection,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// `<config dir>/sensorscope/config.toml`, where the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sensorscope").join("config.toml"))
    }

    /// Load `path`, or the default file when it exists, or the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(path),
                None => Ok(AppConfig::default()),
            },
        }
    }

    /// Store settings with the process environment applied over the file
    pub fn store_config(&self) -> Result<StoreConfig> {
        StoreConfig::resolve(&self.store, |key| std::env::var(key).ok())
    }
}
