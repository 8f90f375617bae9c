//! Long-form to wide-form pivot.
//!
//! Samples arrive as `(timestamp, variable, value)` triples in no particular
//! order. Pivoting sorts them by timestamp and keeps one value per
//! `(timestamp, variable)` pair: the most recent write wins.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::na::NA;
use crate::store::RawSample;

/// Pivoted samples at full input resolution.
///
/// `timestamps` is strictly increasing. Every column has one cell per
/// timestamp. Column names are sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    timestamps: Vec<DateTime<Utc>>,
    columns: BTreeMap<String, Vec<NA<f64>>>,
}

impl PivotTable {
    /// Pivot a batch of raw samples.
    ///
    /// Samples are stably sorted by timestamp, so among duplicates at an
    /// identical instant the one appearing last in the input is kept. NaN
    /// readings are ignored; a variable with no finite reading gets no column.
    pub fn from_samples(samples: &[RawSample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptyData("no samples to pivot".into()));
        }

        let mut sorted: Vec<&RawSample> = samples.iter().collect();
        sorted.sort_by_key(|s| s.timestamp);

        let mut timestamps: Vec<DateTime<Utc>> = Vec::new();
        let mut cells: BTreeMap<&str, BTreeMap<usize, f64>> = BTreeMap::new();

        for sample in sorted {
            if timestamps.last() != Some(&sample.timestamp) {
                timestamps.push(sample.timestamp);
            }
            if sample.value.is_nan() {
                continue;
            }
            let row = timestamps.len() - 1;
            cells
                .entry(sample.variable.as_str())
                .or_default()
                .insert(row, sample.value);
        }

        let rows = timestamps.len();
        let columns = cells
            .into_iter()
            .map(|(name, values)| {
                let mut column = vec![NA::NA; rows];
                for (row, value) in values {
                    column[row] = NA::Value(value);
                }
                (name.to_string(), column)
            })
            .collect();

        log::debug!("pivoted {} samples into {} rows", samples.len(), rows);

        Ok(PivotTable {
            timestamps,
            columns,
        })
    }

    /// Number of distinct timestamps
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Distinct, ascending timestamps
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Sorted column names
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Cells of one column
    pub fn column(&self, name: &str) -> Option<&[NA<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// `(name, cells)` pairs in column order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[NA<f64>])> {
        self.columns
            .iter()
            .map(|(name, cells)| (name.as_str(), cells.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(secs: i64, variable: &str, value: f64) -> RawSample {
        RawSample::new(Utc.timestamp_opt(secs, 0).unwrap(), variable, value)
    }

    #[test]
    fn test_sorts_and_aligns() {
        let samples = vec![
            sample(20, "humidity", 40.0),
            sample(10, "temperature", 21.0),
            sample(10, "humidity", 41.0),
        ];
        let table = PivotTable::from_samples(&samples).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.timestamps()[0].timestamp(), 10);
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["humidity", "temperature"]
        );
        assert_eq!(
            table.column("humidity").unwrap(),
            &[NA::Value(41.0), NA::Value(40.0)]
        );
        assert_eq!(table.column("temperature").unwrap(), &[NA::Value(21.0), NA::NA]);
    }

    #[test]
    fn test_last_write_wins_on_duplicate_timestamp() {
        let samples = vec![
            sample(10, "temperature", 20.0),
            sample(10, "temperature", 25.0),
            sample(5, "temperature", 1.0),
        ];
        let table = PivotTable::from_samples(&samples).unwrap();
        assert_eq!(table.column("temperature").unwrap(), &[NA::Value(1.0), NA::Value(25.0)]);
    }

    #[test]
    fn test_nan_does_not_overwrite() {
        let samples = vec![
            sample(10, "temperature", 20.0),
            sample(10, "temperature", f64::NAN),
            sample(10, "gyro_x", f64::NAN),
        ];
        let table = PivotTable::from_samples(&samples).unwrap();
        assert_eq!(table.column("temperature").unwrap(), &[NA::Value(20.0)]);
        assert!(table.column("gyro_x").is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(PivotTable::from_samples(&[]), Err(Error::EmptyData(_))));
    }
}
