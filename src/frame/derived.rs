//! Derived columns and analyzable-column discovery.

use crate::error::Result;
use crate::frame::WideSeries;
use crate::na::NA;

/// Orthogonal accelerometer axes
pub const ACCEL_AXES: [&str; 3] = ["accel_x", "accel_y", "accel_z"];

/// Name of the acceleration magnitude column
pub const ACCEL_MAGNITUDE: &str = "accel_mag";

/// Append the Euclidean magnitude of three axis columns.
///
/// Computed bucket-wise; a missing cell on any axis gives a missing
/// magnitude. Returns `false` (and leaves the table untouched) unless all
/// three axes are present or the target column already exists.
pub fn add_vector_magnitude(frame: &mut WideSeries, axes: [&str; 3], name: &str) -> Result<bool> {
    if frame.contains_column(name) {
        return Ok(false);
    }
    let (x, y, z) = match (frame.column(axes[0]), frame.column(axes[1]), frame.column(axes[2])) {
        (Some(x), Some(y), Some(z)) => (x, y, z),
        _ => return Ok(false),
    };

    let magnitude: Vec<NA<f64>> = x
        .iter()
        .zip(y)
        .zip(z)
        .map(|((x, y), z)| match (x.get(), y.get(), z.get()) {
            (Some(x), Some(y), Some(z)) => NA::Value((x * x + y * y + z * z).sqrt()),
            _ => NA::NA,
        })
        .collect();

    frame.add_column(name, magnitude)?;
    log::debug!("derived column '{}' from {:?}", name, axes);
    Ok(true)
}

/// Add every derived feature the current columns allow
pub fn add_derived_features(frame: &mut WideSeries) -> Result<()> {
    add_vector_magnitude(frame, ACCEL_AXES, ACCEL_MAGNITUDE)?;
    Ok(())
}

/// Columns worth analysing: numeric and not entirely missing, in table order
pub fn analyzable_columns(frame: &WideSeries) -> Vec<String> {
    frame
        .columns()
        .iter()
        .filter(|c| !c.is_all_na())
        .map(|c| c.name().to_string())
        .collect()
}
