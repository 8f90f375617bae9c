pub mod csv;

// Re-export commonly used functions
pub use csv::{to_csv_bytes, write_csv, write_csv_file, DEFAULT_EXPORT_FILE};
