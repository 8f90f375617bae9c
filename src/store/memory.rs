use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::store::{RawSample, SampleQuery, SampleStore};

/// In-process store holding samples per measurement.
///
/// The lookback window is evaluated against a fixed reference instant, so
/// results do not drift with the wall clock.
#[derive(Debug)]
pub struct InMemoryStore {
    now: DateTime<Utc>,
    samples: Vec<(String, RawSample)>,
    latency: Option<std::time::Duration>,
    failure: Option<Error>,
    calls: AtomicUsize,
}

impl InMemoryStore {
    /// Empty store whose lookback windows end at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        InMemoryStore {
            now,
            samples: Vec::new(),
            latency: None,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Add samples written to `measurement`
    pub fn with_samples<I>(mut self, measurement: &str, samples: I) -> Self
    where
        I: IntoIterator<Item = RawSample>,
    {
        self.samples
            .extend(samples.into_iter().map(|s| (measurement.to_string(), s)));
        self
    }

    /// Block every fetch for `latency`
    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every fetch with `error`
    pub fn failing_with(mut self, error: Error) -> Self {
        self.failure = Some(error);
        self
    }

    /// Number of fetches served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SampleStore for InMemoryStore {
    fn fetch(&self, query: &SampleQuery) -> Result<Vec<RawSample>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let start = self.now - Duration::days(i64::from(query.lookback_days()));
        Ok(self
            .samples
            .iter()
            .filter(|(measurement, sample)| {
                measurement == query.measurement()
                    && query.fields().contains(&sample.variable)
                    && sample.timestamp >= start
                    && sample.timestamp <= self.now
            })
            .map(|(_, sample)| sample.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filters_measurement_fields_and_window() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let store = InMemoryStore::new(now)
            .with_samples(
                "studio-dht22",
                vec![
                    RawSample::new(now - Duration::hours(1), "humidity", 50.0),
                    RawSample::new(now - Duration::days(2), "humidity", 51.0),
                    RawSample::new(now - Duration::hours(1), "pressure", 1.0),
                ],
            )
            .with_samples("mpu6050", vec![RawSample::new(now, "temperature", 30.0)]);

        let query = SampleQuery::new("studio-dht22", ["humidity", "temperature"], 1).unwrap();
        let samples = store.fetch(&query).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 50.0);
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn test_failure() {
        let store = InMemoryStore::new(Utc::now())
            .failing_with(Error::StoreConnection("connection refused".into()));
        let query = SampleQuery::new("m", ["f"], 1).unwrap();
        assert_eq!(
            store.fetch(&query),
            Err(Error::StoreConnection("connection refused".into()))
        );
    }
}
