// Statistics used by the analytics stages: descriptive summaries and
// single-feature least squares.

pub mod descriptive;
pub mod regression;

use serde::Serialize;

use crate::error::Result;

/// Summary statistics of a sample.
///
/// # Example
/// ```rust
/// use sensorscope::stats;
///
/// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let summary = stats::describe(&data).unwrap();
/// assert_eq!(summary.mean, 3.0);
/// ```
pub fn describe<T: AsRef<[f64]>>(data: T) -> Result<DescriptiveStats> {
    descriptive::describe_impl(data.as_ref())
}

/// Arithmetic mean, `None` for an empty sample
pub fn mean(data: &[f64]) -> Option<f64> {
    descriptive::mean_impl(data)
}

/// Sample standard deviation (ddof = 1), `None` with fewer than two points
pub fn sample_std(data: &[f64]) -> Option<f64> {
    descriptive::sample_std_impl(data)
}

/// Fit `y = intercept + slope * x` by ordinary least squares.
///
/// # Example
/// ```rust
/// use sensorscope::stats;
///
/// let x = vec![0.0, 1.0, 2.0];
/// let y = vec![7.0, 10.0, 13.0];
/// let fit = stats::linear_regression(&x, &y).unwrap();
/// assert!((fit.slope - 3.0).abs() < 1e-12);
/// ```
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<LinearRegressionResult> {
    regression::simple_linear_regression_impl(x, y)
}

/// Descriptive statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    /// Number of values
    pub count: usize,
    /// Mean
    pub mean: f64,
    /// Sample standard deviation (0 for a single value)
    pub std: f64,
    /// Minimum
    pub min: f64,
    /// Maximum
    pub max: f64,
}

/// Result of a simple linear regression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearRegressionResult {
    /// Intercept
    pub intercept: f64,
    /// Slope
    pub slope: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// In-sample fitted values
    pub fitted_values: Vec<f64>,
    /// Residuals (observed - fitted)
    pub residuals: Vec<f64>,
}

impl LinearRegressionResult {
    /// Evaluate the fitted line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}
