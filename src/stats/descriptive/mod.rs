// Descriptive statistics

use crate::error::{Error, Result};
use crate::stats::DescriptiveStats;

pub(crate) fn mean_impl(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

pub(crate) fn sample_std_impl(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let mean = mean_impl(data)?;
    let sum_squared_diff = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>();
    Some((sum_squared_diff / (data.len() - 1) as f64).sqrt())
}

/// Summary statistics of a non-empty sample
pub(crate) fn describe_impl(data: &[f64]) -> Result<DescriptiveStats> {
    let mean = mean_impl(data).ok_or_else(|| {
        Error::EmptyData("descriptive statistics need at least one value".into())
    })?;

    let std = sample_std_impl(data).unwrap_or(0.0);
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(DescriptiveStats {
        count: data.len(),
        mean,
        std,
        min,
        max,
    })
}
