// Ordinary least squares with a single explanatory variable

use crate::error::{Error, Result};
use crate::stats::LinearRegressionResult;

/// Closed-form OLS fit of `y` on `x`, with intercept.
///
/// Sums are taken about the means, which keeps the fit stable when `x` is
/// large (elapsed seconds over several days).
pub(crate) fn simple_linear_regression_impl(x: &[f64], y: &[f64]) -> Result<LinearRegressionResult> {
    if x.len() != y.len() {
        return Err(Error::Consistency(format!(
            "regression inputs differ in length: x={}, y={}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(Error::InsufficientData(
            "regression needs at least two points".into(),
        ));
    }

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let y_mean = y.iter().sum::<f64>() / n as f64;

    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&xi, &yi)| {
            let dx = xi - x_mean;
            (sxy + dx * (yi - y_mean), sxx + dx * dx)
        });

    if sxx == 0.0 {
        return Err(Error::InsufficientData(
            "regression needs at least two distinct x values".into(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let fitted_values: Vec<f64> = x.iter().map(|&xi| intercept + slope * xi).collect();
    let residuals: Vec<f64> = y
        .iter()
        .zip(&fitted_values)
        .map(|(&yi, &fi)| yi - fi)
        .collect();

    let ss_total = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum::<f64>();
    let ss_residual = residuals.iter().map(|r| r.powi(2)).sum::<f64>();
    let r_squared = if ss_total == 0.0 {
        1.0
    } else {
        1.0 - ss_residual / ss_total
    };

    Ok(LinearRegressionResult {
        intercept,
        slope,
        r_squared,
        fitted_values,
        residuals,
    })
}
