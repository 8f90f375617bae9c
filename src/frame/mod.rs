//! Wide, regularly indexed multivariate series.

pub mod derived;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::na::NA;
use crate::temporal::ResampleInterval;

pub use derived::{
    add_derived_features, add_vector_magnitude, analyzable_columns, ACCEL_AXES, ACCEL_MAGNITUDE,
};

/// A named column of the wide table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<NA<f64>>,
}

impl Column {
    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cells, aligned with the table index
    pub fn values(&self) -> &[NA<f64>] {
        &self.values
    }

    /// Whether every cell is missing
    pub fn is_all_na(&self) -> bool {
        self.values.iter().all(NA::is_na)
    }
}

/// Table keyed by evenly spaced time buckets, one column per variable.
///
/// The index is strictly increasing with a spacing of exactly one resample
/// interval; empty buckets are kept as `NA` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct WideSeries {
    index: Vec<DateTime<Tz>>,
    columns: Vec<Column>,
    interval: ResampleInterval,
}

impl WideSeries {
    /// Create a table with the given index and no columns
    pub fn new(index: Vec<DateTime<Tz>>, interval: ResampleInterval) -> Result<Self> {
        let series = WideSeries {
            index,
            columns: Vec::new(),
            interval,
        };
        series.check_index()?;
        Ok(series)
    }

    /// Append a column
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<NA<f64>>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(Error::Consistency(format!(
                "column '{}' has {} cells but the index has {} rows",
                name,
                values.len(),
                self.index.len()
            )));
        }
        if self.contains_column(&name) {
            return Err(Error::InvalidInput(format!("duplicate column '{}'", name)));
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bucket start times, in the display timezone
    pub fn index(&self) -> &[DateTime<Tz>] {
        &self.index
    }

    /// Resample cadence
    pub fn interval(&self) -> ResampleInterval {
        self.interval
    }

    /// Columns in table order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Whether a column exists
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Cells of one column
    pub fn column(&self, name: &str) -> Option<&[NA<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(Column::values)
    }

    /// Last `n` rows (all rows when `n` exceeds the length)
    pub fn tail(&self, n: usize) -> WideSeries {
        let start = self.len().saturating_sub(n);
        WideSeries {
            index: self.index[start..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[start..].to_vec(),
                })
                .collect(),
            interval: self.interval,
        }
    }

    /// One column with missing cells dropped
    pub fn dropna(&self, name: &str) -> Result<DenseSeries> {
        let values = self
            .column(name)
            .ok_or_else(|| Error::InvalidInput(format!("unknown column '{}'", name)))?;

        let (timestamps, values) = self
            .index
            .iter()
            .zip(values)
            .filter_map(|(ts, v)| v.get().map(|v| (*ts, v)))
            .unzip();

        Ok(DenseSeries {
            name: name.to_string(),
            timestamps,
            values,
        })
    }

    /// Verify the index is strictly increasing and evenly spaced
    pub fn check_index(&self) -> Result<()> {
        let step = self.interval.duration();
        for pair in self.index.windows(2) {
            if pair[1] - pair[0] != step {
                return Err(Error::Consistency(format!(
                    "index is not spaced at {}: {} -> {}",
                    self.interval, pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }
}

/// A single variable with its missing cells removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSeries {
    name: String,
    timestamps: Vec<DateTime<Tz>>,
    values: Vec<f64>,
}

impl DenseSeries {
    /// Build a series from aligned timestamps and values
    pub fn new(
        name: impl Into<String>,
        timestamps: Vec<DateTime<Tz>>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(Error::Consistency(format!(
                "{} timestamps for {} values",
                timestamps.len(),
                values.len()
            )));
        }
        Ok(DenseSeries {
            name: name.into(),
            timestamps,
            values,
        })
    }

    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Retained timestamps
    pub fn timestamps(&self) -> &[DateTime<Tz>] {
        &self.timestamps
    }

    /// Retained values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of retained points
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was retained
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
