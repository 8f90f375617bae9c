use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::frame::WideSeries;
use crate::na::NA;

/// Default file name for the resampled export
pub const DEFAULT_EXPORT_FILE: &str = "resampled_data.csv";

/// Header of the time index column
pub const TIME_COLUMN: &str = "time";

/// RFC 3339 with a numeric offset
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Write the wide table as delimited text.
///
/// The first column is the bucket time in the display timezone, followed by
/// every variable in table order. Missing cells are written empty.
pub fn write_csv<W: Write>(frame: &WideSeries, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    let mut header = Vec::with_capacity(frame.columns().len() + 1);
    header.push(TIME_COLUMN);
    header.extend(frame.column_names());
    wtr.write_record(&header)?;

    for (row, ts) in frame.index().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(ts.format(TIME_FORMAT).to_string());
        for column in frame.columns() {
            record.push(match column.values()[row] {
                NA::Value(v) => v.to_string(),
                NA::NA => String::new(),
            });
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// UTF-8 encoded export, ready to hand to a download
pub fn to_csv_bytes(frame: &WideSeries) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(frame, &mut buffer)?;
    Ok(buffer)
}

/// Write the export to a file
pub fn write_csv_file<P: AsRef<Path>>(frame: &WideSeries, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv(frame, file)?;
    log::info!("exported {} rows to {}", frame.len(), path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{parse_timezone, ResampleInterval};
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_layout() {
        let tz = parse_timezone("America/Bogota").unwrap();
        let start = tz.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let index = vec![start, start + Duration::minutes(1)];
        let mut wide = WideSeries::new(index, ResampleInterval::OneMinute).unwrap();
        wide.add_column("humidity", vec![NA::Value(40.5), NA::NA]).unwrap();
        wide.add_column("temperature", vec![NA::NA, NA::Value(21.0)]).unwrap();

        let text = String::from_utf8(to_csv_bytes(&wide).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time,humidity,temperature");
        assert_eq!(lines[1], "2024-05-01T08:00:00-05:00,40.5,");
        assert_eq!(lines[2], "2024-05-01T08:01:00-05:00,,21");

        let stamp = lines[1].split(',').next().unwrap();
        let parsed = chrono::DateTime::parse_from_rfc3339(stamp).unwrap();
        assert_eq!(parsed, start);
    }
}
