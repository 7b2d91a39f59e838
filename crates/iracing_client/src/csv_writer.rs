//! Persist telemetry records as a timestamped CSV file.

use crate::IracingError;
use crate::records::{TelemetryRecord, key_union, render_cell};
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const FILE_PREFIX: &str = "iracing_all_data_";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// File name for a run started at `at`.
pub fn file_name(at: &DateTime<Local>) -> String {
    format!("{FILE_PREFIX}{}.csv", at.format(TIMESTAMP_FORMAT))
}

/// Write `records` into `output_dir` using the current local time.
pub fn write_records(
    records: &[TelemetryRecord],
    output_dir: &Path,
) -> Result<PathBuf, IracingError> {
    write_records_at(records, output_dir, &Local::now())
}

/// Write `records` into `output_dir`, naming the file after `at`.
///
/// The header is the sorted union of record keys and missing fields are
/// left empty. An existing file with the same name is never overwritten.
pub fn write_records_at(
    records: &[TelemetryRecord],
    output_dir: &Path,
    at: &DateTime<Local>,
) -> Result<PathBuf, IracingError> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(file_name(at));

    let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);

    let columns = key_union(records);
    if !columns.is_empty() {
        writer.write_record(&columns)?;
        for record in records {
            writer.write_record(columns.iter().map(|c| render_cell(record.get(c))))?;
        }
    }
    writer.flush()?;

    tracing::debug!(
        rows = records.len(),
        columns = columns.len(),
        path = %path.display(),
        "wrote telemetry csv"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::records_from_value;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 6, 14, h, m, s)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn file_name_embeds_timestamp() {
        assert_eq!(file_name(&at(7, 5, 3)), "iracing_all_data_2025-06-14_07-05-03.csv");
    }

    #[test]
    fn header_is_sorted_union_and_gaps_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records =
            records_from_value(json!([{"lap":1,"speed":120},{"lap":2,"time":33.1}])).unwrap();
        let path = write_records_at(&records, dir.path(), &at(12, 0, 0)).expect("write");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["lap,speed,time", "1,120,", "2,,33.1"]);
        assert!(contents.ends_with("\r\n"));
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let records = records_from_value(json!([{"car": "MX-5"}])).unwrap();
        let path = write_records_at(&records, &nested, &at(9, 30, 0)).expect("write");
        assert!(path.starts_with(&nested));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "car\r\nMX-5\r\n");
    }

    #[test]
    fn values_needing_quotes_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let records =
            records_from_value(json!([{"track": "Spa, Belgium", "note": "said \"hi\""}])).unwrap();
        let path = write_records_at(&records, dir.path(), &at(1, 2, 3)).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "note,track\r\n\"said \"\"hi\"\"\",\"Spa, Belgium\"\r\n");
    }

    #[test]
    fn empty_payload_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_records_at(&[], dir.path(), &at(0, 0, 1)).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let records = records_from_value(json!([{"lap": 1}])).unwrap();
        write_records_at(&records, dir.path(), &at(10, 0, 0)).unwrap();
        let err = write_records_at(&records, dir.path(), &at(10, 0, 0)).unwrap_err();
        assert!(matches!(
            err,
            IracingError::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists
        ));
    }

    #[test]
    fn repeated_runs_produce_distinct_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        let records = records_from_value(json!([{"lap": 1, "speed": 99.5}])).unwrap();
        let first = write_records_at(&records, dir.path(), &at(10, 0, 0)).unwrap();
        let second = write_records_at(&records, dir.path(), &at(10, 0, 1)).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            std::fs::read(first).unwrap(),
            std::fs::read(second).unwrap()
        );
    }
}
