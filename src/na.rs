use serde::{Serialize, Serializer};
use std::fmt::{self, Debug};

/// A cell that may be missing.
///
/// Resampled buckets with no input samples are `NA`, never zero and never
/// forward-filled. Downstream statistics drop them first.
#[derive(Clone, Copy)]
pub enum NA<T> {
    /// A present value
    Value(T),
    /// A missing value
    NA,
}

impl<T> NA<T> {
    /// Whether the cell is missing
    pub fn is_na(&self) -> bool {
        matches!(self, NA::NA)
    }
}

impl NA<f64> {
    /// The value, if present
    pub fn get(&self) -> Option<f64> {
        match self {
            NA::Value(v) => Some(*v),
            NA::NA => None,
        }
    }
}

/// Iterate over the present values of a column, skipping `NA`.
pub fn present(values: &[NA<f64>]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(NA::get)
}

impl<T: Debug> Debug for NA<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NA::Value(v) => write!(f, "{:?}", v),
            NA::NA => write!(f, "NA"),
        }
    }
}

impl<T: PartialEq> PartialEq for NA<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NA::Value(a), NA::Value(b)) => a == b,
            (NA::NA, NA::NA) => true,
            _ => false,
        }
    }
}

// Missing cells serialize as JSON null.
impl<T: Serialize> Serialize for NA<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NA::Value(v) => serializer.serialize_some(v),
            NA::NA => serializer.serialize_none(),
        }
    }
}
