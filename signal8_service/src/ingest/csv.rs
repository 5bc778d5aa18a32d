//! HKO 10-minute wind CSV loader.
//!
//! Each event folder holds one CSV per 10-minute snapshot (or per batch of
//! snapshots), with a row per automatic weather station:
//!
//! ```text
//! Date time,Automatic Weather Station,10-Minute Mean Wind Direction(Compass points),10-Minute Mean Speed(km/hour),10-Minute Maximum Gust(km/hour)
//! 201809161000,Cheung Chau,East,86,112
//! ```
//!
//! Columns are located by header name, so extra or reordered columns are
//! fine. Wind values are kept as text; the timeline builder decides what is
//! numeric.

use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, TimeZone};

use crate::ingest::IngestError;
use crate::model::{HKT, RawTimeline, RawWindSample, Timestamp};
use crate::stations::is_reference_station;

pub const COL_DATETIME: &str = "Date time";
pub const COL_STATION: &str = "Automatic Weather Station";
pub const COL_MEAN_SPEED: &str = "10-Minute Mean Speed(km/hour)";
pub const COL_MAX_GUST: &str = "10-Minute Maximum Gust(km/hour)";

/// Compact local timestamp used in the "Date time" column.
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Counters from loading one or more CSV files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvLoadStats {
    pub files: usize,
    pub rows: usize,
    /// Rows for one of the eight reference stations.
    pub reference_rows: usize,
    /// Rows dropped for being short or carrying an unreadable timestamp.
    pub skipped_rows: usize,
}

/// Parses "201809161000" as 2018-09-16 10:00 HKT.
pub fn parse_csv_timestamp(raw: &str) -> Option<Timestamp> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), CSV_TIMESTAMP_FORMAT).ok()?;
    HKT.from_local_datetime(&naive).single()
}

/// Splits one CSV record, honouring double-quoted fields and `""` escapes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn column_index(header: &[String], column: &str, source: &Path) -> Result<usize, IngestError> {
    header
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| IngestError::MissingColumn {
            path: source.to_path_buf(),
            column: column.to_string(),
        })
}

/// Merges one CSV document into `timeline`.
///
/// Only reference stations are kept. A later row for the same station and
/// timestamp replaces an earlier one. `source` is used for error messages.
pub fn parse_station_csv(
    text: &str,
    source: &Path,
    timeline: &mut RawTimeline,
    stats: &mut CsvLoadStats,
) -> Result<(), IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Ok(());
    };
    let header = split_record(header_line);
    let idx_time = column_index(&header, COL_DATETIME, source)?;
    let idx_station = column_index(&header, COL_STATION, source)?;
    let idx_mean = column_index(&header, COL_MEAN_SPEED, source)?;
    let idx_gust = column_index(&header, COL_MAX_GUST, source)?;

    for line in lines {
        stats.rows += 1;
        let fields = split_record(line);
        if fields.len() < header.len() {
            stats.skipped_rows += 1;
            continue;
        }

        let station_name = fields[idx_station].trim();
        if !is_reference_station(station_name) {
            continue;
        }
        let Some(timestamp) = parse_csv_timestamp(&fields[idx_time]) else {
            stats.skipped_rows += 1;
            continue;
        };

        stats.reference_rows += 1;
        timeline.entry(timestamp).or_default().insert(
            station_name.to_string(),
            RawWindSample {
                mean: Some(fields[idx_mean].trim().to_string()),
                gust: Some(fields[idx_gust].trim().to_string()),
            },
        );
    }
    Ok(())
}

/// Loads every `*.csv` in an event folder, in file-name order.
pub fn load_event_directory(dir: &Path) -> Result<(RawTimeline, CsvLoadStats), IngestError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| IngestError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    paths.sort();

    let mut timeline = RawTimeline::new();
    let mut stats = CsvLoadStats::default();
    for path in &paths {
        let text = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
        parse_station_csv(&text, path, &mut timeline, &mut stats)?;
        stats.files += 1;
    }
    Ok((timeline, stats))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date time,Automatic Weather Station,10-Minute Mean Wind Direction(Compass points),10-Minute Mean Speed(km/hour),10-Minute Maximum Gust(km/hour)";

    fn parse(text: &str) -> (RawTimeline, CsvLoadStats) {
        let mut timeline = RawTimeline::new();
        let mut stats = CsvLoadStats::default();
        parse_station_csv(text, Path::new("test.csv"), &mut timeline, &mut stats)
            .expect("valid CSV");
        (timeline, stats)
    }

    #[test]
    fn test_csv_timestamp_is_hkt() {
        let ts = parse_csv_timestamp("201809161000").expect("valid timestamp");
        assert_eq!(ts.to_rfc3339(), "2018-09-16T10:00:00+08:00");
        assert!(parse_csv_timestamp("2018-09-16 10:00").is_none());
        assert!(parse_csv_timestamp("").is_none());
    }

    #[test]
    fn test_reference_rows_are_kept_and_others_dropped() {
        let text = format!(
            "{}\n201809161000,Cheung Chau,East,86,112\n201809161000,Waglan Island,East,120,150\n",
            HEADER
        );
        let (timeline, stats) = parse(&text);

        assert_eq!(stats.rows, 2);
        assert_eq!(stats.reference_rows, 1);
        let cells = timeline.values().next().expect("one timestamp");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells["Cheung Chau"].mean.as_deref(), Some("86"));
        assert_eq!(cells["Cheung Chau"].gust.as_deref(), Some("112"));
    }

    #[test]
    fn test_timestamp_with_only_other_stations_creates_no_interval() {
        let text = format!("{}\n201809161000,Waglan Island,East,120,150\n", HEADER);
        let (timeline, _) = parse(&text);
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_bom_and_blank_lines_are_tolerated() {
        let text = format!("\u{feff}{}\n\n201809161010,Sha Tin,North,N/A,70\n\n", HEADER);
        let (timeline, stats) = parse(&text);
        assert_eq!(stats.reference_rows, 1);
        let cells = timeline.values().next().expect("one timestamp");
        assert_eq!(cells["Sha Tin"].mean.as_deref(), Some("N/A"));
    }

    #[test]
    fn test_short_and_badly_timestamped_rows_are_skipped() {
        let text = format!(
            "{}\n201809161000,Kai Tak\nnot-a-time,Kai Tak,East,70,90\n201809161000,Kai Tak,East,70,90\n",
            HEADER
        );
        let (timeline, stats) = parse(&text);
        assert_eq!(stats.skipped_rows, 2);
        assert_eq!(stats.reference_rows, 1);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_later_row_overwrites_earlier_for_same_slot() {
        let text = format!(
            "{}\n201809161000,Kai Tak,East,70,90\n201809161000,Kai Tak,East,72,95\n",
            HEADER
        );
        let (timeline, _) = parse(&text);
        let cells = timeline.values().next().expect("one timestamp");
        assert_eq!(cells["Kai Tak"].mean.as_deref(), Some("72"));
    }

    #[test]
    fn test_quoted_fields_are_unwrapped() {
        let text = format!("{}\n\"201809161000\",\"Tsing Yi\",\"East, by north\",\"64\",\"80\"\n", HEADER);
        let (timeline, _) = parse(&text);
        let cells = timeline.values().next().expect("one timestamp");
        assert_eq!(cells["Tsing Yi"].mean.as_deref(), Some("64"));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let mut timeline = RawTimeline::new();
        let mut stats = CsvLoadStats::default();
        let result = parse_station_csv(
            "Date time,Automatic Weather Station\n201809161000,Kai Tak\n",
            Path::new("bad.csv"),
            &mut timeline,
            &mut stats,
        );
        assert_eq!(
            result,
            Err(IngestError::MissingColumn {
                path: PathBuf::from("bad.csv"),
                column: COL_MEAN_SPEED.to_string(),
            })
        );
    }

    #[test]
    fn test_empty_file_is_not_an_error() {
        let (timeline, stats) = parse("");
        assert!(timeline.is_empty());
        assert_eq!(stats.rows, 0);
    }

    #[test]
    fn test_split_record_handles_escaped_quotes() {
        assert_eq!(
            split_record("a,\"b \"\"c\"\"\",d"),
            vec!["a".to_string(), "b \"c\"".to_string(), "d".to_string()]
        );
    }
}
