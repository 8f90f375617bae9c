use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::frame::WideSeries;
use crate::na::NA;
use crate::pivot::PivotTable;
use crate::temporal::{to_display, ResampleInterval};

/// Mean-aggregating resampler over fixed-width buckets.
///
/// Buckets are floored on UTC epoch milliseconds. The output covers every
/// bucket between the first and the last input timestamp; buckets without
/// input are `NA`.
#[derive(Debug, Clone)]
pub struct Resampler {
    interval: ResampleInterval,
    timezone: Tz,
}

impl Resampler {
    /// Create a resampler emitting its index in `timezone`
    pub fn new(interval: ResampleInterval, timezone: Tz) -> Self {
        Resampler { interval, timezone }
    }

    /// Resample cadence
    pub fn interval(&self) -> ResampleInterval {
        self.interval
    }

    /// Start of the bucket containing `ts`, in epoch milliseconds
    pub fn bucket_start(&self, ts: &DateTime<Utc>) -> i64 {
        let step = self.interval.to_millis();
        ts.timestamp_millis().div_euclid(step) * step
    }

    /// Resample a pivot table by averaging each bucket
    pub fn mean(&self, table: &PivotTable) -> Result<WideSeries> {
        let timestamps = table.timestamps();
        let (first, last) = match (timestamps.first(), timestamps.last()) {
            (Some(first), Some(last)) => (self.bucket_start(first), self.bucket_start(last)),
            _ => return Err(Error::EmptyData("nothing to resample".into())),
        };

        let step = self.interval.to_millis();
        let rows = ((last - first) / step + 1) as usize;
        let slots: Vec<usize> = timestamps
            .iter()
            .map(|ts| ((self.bucket_start(ts) - first) / step) as usize)
            .collect();

        let index = (0..rows)
            .map(|row| {
                let millis = first + row as i64 * step;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(|ts| to_display(&ts, &self.timezone))
                    .ok_or_else(|| {
                        Error::Consistency(format!("bucket start {}ms is out of range", millis))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut wide = WideSeries::new(index, self.interval)?;

        for (name, cells) in table.columns() {
            let mut sums = vec![0.0_f64; rows];
            let mut counts = vec![0_usize; rows];
            for (slot, cell) in slots.iter().zip(cells) {
                if let NA::Value(v) = cell {
                    sums[*slot] += v;
                    counts[*slot] += 1;
                }
            }
            let values = sums
                .into_iter()
                .zip(counts)
                .map(|(sum, count)| {
                    let mean = sum / count as f64;
                    // empty buckets and +inf/-inf mixes are both missing
                    if count == 0 || mean.is_nan() {
                        NA::NA
                    } else {
                        NA::Value(mean)
                    }
                })
                .collect();
            wide.add_column(name, values)?;
        }

        log::debug!(
            "resampled {} rows into {} buckets of {}",
            table.len(),
            rows,
            self.interval
        );
        Ok(wide)
    }
}
