//! Time handling for the telemetry pipeline: resample cadence, timezone
//! normalisation, bucket resampling and trailing windows.

mod frequency;
mod resample;
mod timezone;
mod window;

pub use self::frequency::ResampleInterval;
pub use self::resample::Resampler;
pub use self::timezone::{
    normalize_utc, parse_rfc3339_utc, parse_timezone, to_display, DEFAULT_DISPLAY_TIMEZONE,
};
pub use self::window::{TrailingWindow, MAX_WINDOW};
