//! Trailing window smoothing.

use crate::error::{Error, Result};
use crate::na::{present, NA};

/// Largest window the dashboard exposes
pub const MAX_WINDOW: usize = 50;

/// Trailing moving average with partial windows at the start.
///
/// Position `i` averages the present cells among the last `min(w, i + 1)`
/// positions, so there is no leading gap. A window with no present cell
/// yields `NA`. The output is aligned index-for-index with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingWindow {
    size: usize,
}

impl TrailingWindow {
    /// Create a window of `size` points, within `1..=MAX_WINDOW`
    pub fn new(size: usize) -> Result<Self> {
        if !(1..=MAX_WINDOW).contains(&size) {
            return Err(Error::InvalidInput(format!(
                "moving-average window must be within 1..={} points, got {}",
                MAX_WINDOW, size
            )));
        }
        Ok(TrailingWindow { size })
    }

    /// Window size in points
    pub fn size(&self) -> usize {
        self.size
    }

    /// Moving average of a column
    pub fn mean(&self, values: &[NA<f64>]) -> Vec<NA<f64>> {
        (0..values.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.size);
                let (sum, count) = present(&values[start..=i])
                    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
                if count == 0 {
                    NA::NA
                } else {
                    NA::Value(sum / count as f64)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[f64]) -> Vec<NA<f64>> {
        values.iter().map(|v| NA::Value(*v)).collect()
    }

    #[test]
    fn test_partial_windows_at_start() {
        let ma = TrailingWindow::new(3).unwrap().mean(&col(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(ma, col(&[1.0, 1.5, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let input = vec![NA::Value(0.1), NA::NA, NA::Value(7.25)];
        assert_eq!(TrailingWindow::new(1).unwrap().mean(&input), input);
    }

    #[test]
    fn test_missing_cells_skipped() {
        let input = vec![NA::Value(2.0), NA::NA, NA::NA, NA::Value(4.0)];
        let ma = TrailingWindow::new(2).unwrap().mean(&input);
        assert_eq!(ma, vec![NA::Value(2.0), NA::Value(2.0), NA::NA, NA::Value(4.0)]);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(TrailingWindow::new(0).is_err());
    }

    #[test]
    fn test_window_longer_than_series() {
        let ma = TrailingWindow::new(MAX_WINDOW).unwrap().mean(&col(&[2.0, 4.0]));
        assert_eq!(ma, col(&[2.0, 3.0]));
    }
}
