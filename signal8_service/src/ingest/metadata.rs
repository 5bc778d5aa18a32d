//! Event metadata from markdown tables.
//!
//! Three tables feed the per-event metadata:
//! - the Signal 8 time table (`time_of_signal_8.md`), the primary source;
//! - the portal event table, which fills gaps and carries Signal 10 times
//!   and severity;
//! - the casualty table, which attaches casualty and property-loss figures.
//!
//! Rows that cannot be parsed are logged and skipped; they never abort the
//! load.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;
use serde::Serialize;

use crate::ingest::IngestError;
use crate::logging::{self, Stage};
use crate::model::{HKT, Timestamp};

pub const SIGNAL_HEADER: &[&str] = &[
    "Storm",
    "Year",
    "Signal 8 Issued",
    "Signal 8 Replaced/Cancelled",
    "Duration",
    "Signal 10",
    "Notes",
];

pub const PORTAL_EVENT_HEADER: &[&str] = &[
    "Event ID",
    "Name",
    "Chinese",
    "Year",
    "Date Range",
    "Official Signal 8 Start",
    "Official Signal 8 End",
    "Official Signal 10 Start",
    "Official Signal 10 End",
    "Severity",
];

pub const CASUALTY_HEADER: &[&str] = &[
    "Name",
    "Year",
    "Deaths",
    "Missing",
    "Injured",
    "Shipwreck (oceangoing)",
    "Destroyed Small Boats",
    "Damaged Small Boats",
];

/// "14:40, 1 Sep 2023"
const SIGNAL_TIME_FORMAT: &str = "%H:%M, %d %b %Y";
/// "2023-09-01 14:40"
const PORTAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("SLUG_RE regex should compile"));
static NAMES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\((.+)\)").expect("NAMES_RE regex should compile"));
static SIGNAL10_FULL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}:\d{2}),\s*(\d{1,2}\s+\w+\s+\d{4})\s+to\s+(\d{2}:\d{2}),\s*(\d{1,2}\s+\w+\s+\d{4})")
        .expect("SIGNAL10_FULL_RE regex should compile")
});
static SIGNAL10_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{2}:\d{2}),\s*(\d{1,2}\s+\w+(?:\s+\d{4})?)\s+to\s+(\d{2}:\d{2}),\s*(\d{1,2}\s+\w+(?:\s+\d{4})?)",
    )
    .expect("SIGNAL10_RANGE_RE regex should compile")
});
static SIGNAL10_CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}:\d{2})-(\d{2}:\d{2})").expect("SIGNAL10_CLOCK_RE regex should compile")
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Casualty {
    pub deaths: u32,
    pub missing: u32,
    pub injured: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyLoss {
    pub shipwreck_oceangoing: u32,
    pub destroyed_small_boats: u32,
    pub damaged_small_boats: u32,
}

/// Everything known about one event apart from its wind observations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventMetadata {
    pub id: String,
    pub name_en: String,
    pub name_zh: String,
    pub year: Option<i32>,
    /// "T8" or "T10" unless the portal table says otherwise.
    pub severity: String,
    pub official_signal8_start: Option<Timestamp>,
    pub official_signal8_end: Option<Timestamp>,
    pub official_signal10_start: Option<Timestamp>,
    pub official_signal10_end: Option<Timestamp>,
    pub notes: Vec<String>,
    pub casualty: Option<Casualty>,
    pub property_loss: Option<PropertyLoss>,
}

pub type TableRow = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Lowercase, runs of anything but `[a-z0-9]` collapsed to "-", ends trimmed:
/// "Hato (天鴿)" -> "hato".
pub fn slugify(text: &str) -> String {
    SLUG_RE
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Splits "Hato (天鴿)" into ("Hato", "天鴿"). No parentheses: empty Chinese name.
pub fn split_names(value: &str) -> (String, String) {
    match NAMES_RE.captures(value) {
        Some(caps) => (caps[1].trim().to_string(), caps[2].trim().to_string()),
        None => (value.trim().to_string(), String::new()),
    }
}

fn parse_local(value: &str, format: &str) -> Option<Timestamp> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), format).ok()?;
    HKT.from_local_datetime(&naive).single()
}

pub fn parse_signal_time(value: &str) -> Option<Timestamp> {
    parse_local(value, SIGNAL_TIME_FORMAT)
}

pub fn parse_portal_time(value: &str) -> Option<Timestamp> {
    parse_local(value, PORTAL_TIME_FORMAT)
}

/// The trimmed cell, unless it is blank or "-".
fn present_value(cell: Option<&String>) -> Option<&str> {
    cell.map(|c| c.trim()).filter(|c| !c.is_empty() && *c != "-")
}

// ---------------------------------------------------------------------------
// Markdown tables
// ---------------------------------------------------------------------------

fn split_cells(line: &str) -> Vec<String> {
    line.trim_matches('|')
        .split('|')
        .map(|c| c.trim().to_string())
        .collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| c.chars().all(|ch| ch == '-' || ch == ':'))
}

/// Extracts the rows of the first table whose header is exactly
/// `expected_header`. Returns `None` when no such header exists.
///
/// Separator rows and rows with the wrong number of cells are dropped.
pub fn parse_markdown_table(text: &str, expected_header: &[&str]) -> Option<Vec<TableRow>> {
    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for raw_line in text.lines() {
        let stripped = raw_line.trim();
        if !stripped.starts_with('|') {
            continue;
        }
        let cells = split_cells(stripped);
        if header.is_none() {
            if cells.iter().map(String::as_str).eq(expected_header.iter().copied()) {
                header = Some(cells);
            }
            continue;
        }
        let Some(columns) = &header else {
            continue;
        };
        if is_separator_row(&cells) || cells.len() != columns.len() {
            continue;
        }
        rows.push(columns.iter().cloned().zip(cells).collect());
    }

    header.map(|_| rows)
}

// ---------------------------------------------------------------------------
// Signal 10 window
// ---------------------------------------------------------------------------

/// Parses "HH:MM, D Mon[ YYYY]" taking the year from `reference` when
/// missing, then rolls forward a day at a time until not before `reference`.
fn parse_partial(time: &str, date: &str, reference: Timestamp) -> Option<Timestamp> {
    let date = date.trim();
    let date = if date.split_whitespace().count() == 2 {
        format!("{} {}", date, reference.year())
    } else {
        date.to_string()
    };
    let mut value = parse_signal_time(&format!("{}, {}", time, date))?;
    while value < reference {
        value += Duration::days(1);
    }
    Some(value)
}

fn at_clock(day_of: Timestamp, clock: &str) -> Option<Timestamp> {
    let time = NaiveTime::parse_from_str(clock, "%H:%M").ok()?;
    HKT.from_local_datetime(&day_of.date_naive().and_time(time)).single()
}

/// Recovers the Signal 10 window from the Signal 8 table's notes.
///
/// Only consulted when the "Signal 10" cell says "yes". Three note shapes
/// are understood, tried in order:
/// - "13:30, 16 Sep 2018 to 19:40, 16 Sep 2018"
/// - "13:30, 16 Sep to 19:40, 16 Sep" (year and day roll from the Signal 8 start)
/// - "13:30-19:40" (on or after the Signal 8 start)
pub fn parse_signal10_window(
    signal10_flag: &str,
    notes: &str,
    official_start: Timestamp,
) -> Option<(Timestamp, Timestamp)> {
    if !signal10_flag.trim().eq_ignore_ascii_case("yes") {
        return None;
    }

    if let Some(caps) = SIGNAL10_FULL_RE.captures(notes) {
        let start = parse_signal_time(&format!("{}, {}", &caps[1], &caps[2]))?;
        let end = parse_signal_time(&format!("{}, {}", &caps[3], &caps[4]))?;
        return Some((start, end));
    }

    if let Some(caps) = SIGNAL10_RANGE_RE.captures(notes) {
        let start = parse_partial(&caps[1], &caps[2], official_start)?;
        let mut end = parse_partial(&caps[3], &caps[4], start)?;
        while end <= start {
            end += Duration::days(1);
        }
        return Some((start, end));
    }

    let caps = SIGNAL10_CLOCK_RE.captures(notes)?;
    let mut start = at_clock(official_start, &caps[1])?;
    if start < official_start {
        start += Duration::days(1);
    }
    let mut end = at_clock(start, &caps[2])?;
    while end <= start {
        end += Duration::days(1);
    }
    Some((start, end))
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

fn cell<'a>(row: &'a TableRow, column: &str) -> &'a str {
    row.get(column).map(|s| s.trim()).unwrap_or("")
}

fn apply_signal_row(metadata: &mut BTreeMap<String, EventMetadata>, row: &TableRow) {
    let (name_en, name_zh) = split_names(cell(row, "Storm"));
    let id = slugify(&name_en);

    let (Some(issued), Some(cancelled)) = (
        parse_signal_time(cell(row, "Signal 8 Issued")),
        parse_signal_time(cell(row, "Signal 8 Replaced/Cancelled")),
    ) else {
        logging::warn(Stage::Metadata, Some(&id), "unreadable Signal 8 times, row skipped");
        return;
    };
    let Ok(year) = cell(row, "Year").parse::<i32>() else {
        logging::warn(Stage::Metadata, Some(&id), "unreadable year, row skipped");
        return;
    };

    let notes_text = cell(row, "Notes");
    let signal10 = parse_signal10_window(cell(row, "Signal 10"), notes_text, issued);
    let notes = notes_text
        .split(';')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect();

    metadata.insert(
        id.clone(),
        EventMetadata {
            id,
            name_en,
            name_zh,
            year: Some(year),
            severity: String::new(),
            official_signal8_start: Some(issued),
            official_signal8_end: Some(cancelled),
            official_signal10_start: signal10.map(|(s, _)| s),
            official_signal10_end: signal10.map(|(_, e)| e),
            notes,
            casualty: None,
            property_loss: None,
        },
    );
}

fn portal_time(row: &TableRow, column: &str, id: &str) -> Option<Timestamp> {
    let value = present_value(row.get(column))?;
    let parsed = parse_portal_time(value);
    if parsed.is_none() {
        logging::warn(
            Stage::Metadata,
            Some(id),
            &format!("unreadable '{}' value '{}' in portal table", column, value),
        );
    }
    parsed
}

fn apply_portal_row(metadata: &mut BTreeMap<String, EventMetadata>, row: &TableRow) {
    let id = cell(row, "Event ID").to_string();
    if id.is_empty() {
        return;
    }

    let is_new = !metadata.contains_key(&id);
    let meta = metadata.entry(id.clone()).or_insert_with(|| EventMetadata {
        id: id.clone(),
        ..EventMetadata::default()
    });

    if is_new {
        meta.name_en = cell(row, "Name").to_string();
        meta.name_zh = cell(row, "Chinese").to_string();
    }
    if meta.official_signal8_start.is_none() {
        meta.official_signal8_start = portal_time(row, "Official Signal 8 Start", &id);
    }
    if meta.official_signal8_end.is_none() {
        meta.official_signal8_end = portal_time(row, "Official Signal 8 End", &id);
    }
    if let Some(start) = portal_time(row, "Official Signal 10 Start", &id) {
        meta.official_signal10_start = Some(start);
    }
    if let Some(end) = portal_time(row, "Official Signal 10 End", &id) {
        meta.official_signal10_end = Some(end);
    }

    let severity = cell(row, "Severity");
    meta.severity = if severity.is_empty() {
        default_severity(meta).to_string()
    } else {
        severity.to_string()
    };
    if meta.year.is_none() {
        meta.year = cell(row, "Year").parse().ok();
    }
}

fn apply_casualty_row(metadata: &mut BTreeMap<String, EventMetadata>, row: &TableRow) {
    let id = slugify(cell(row, "Name"));
    let Some(meta) = metadata.get_mut(&id) else {
        return;
    };

    let count = |column: &str| cell(row, column).replace(',', "").parse::<u32>().ok();
    let figures = (
        count("Deaths"),
        count("Missing"),
        count("Injured"),
        count("Shipwreck (oceangoing)"),
        count("Destroyed Small Boats"),
        count("Damaged Small Boats"),
    );
    let (
        Some(deaths),
        Some(missing),
        Some(injured),
        Some(shipwreck),
        Some(destroyed),
        Some(damaged),
    ) = figures
    else {
        logging::warn(Stage::Metadata, Some(&id), "unreadable casualty figures, row skipped");
        return;
    };

    meta.casualty = Some(Casualty {
        deaths,
        missing,
        injured,
    });
    meta.property_loss = Some(PropertyLoss {
        shipwreck_oceangoing: shipwreck,
        destroyed_small_boats: destroyed,
        damaged_small_boats: damaged,
    });
}

fn default_severity(meta: &EventMetadata) -> &'static str {
    if meta.official_signal10_start.is_some() { "T10" } else { "T8" }
}

/// Merges the three tables into per-event metadata keyed by event id.
pub fn build_metadata(
    signal_rows: &[TableRow],
    portal_rows: &[TableRow],
    casualty_rows: &[TableRow],
) -> BTreeMap<String, EventMetadata> {
    let mut metadata = BTreeMap::new();
    for row in signal_rows {
        apply_signal_row(&mut metadata, row);
    }
    for row in portal_rows {
        apply_portal_row(&mut metadata, row);
    }
    for row in casualty_rows {
        apply_casualty_row(&mut metadata, row);
    }
    for meta in metadata.values_mut() {
        if meta.severity.is_empty() {
            meta.severity = default_severity(meta).to_string();
        }
    }
    metadata
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Where the three metadata tables live.
#[derive(Debug, Clone)]
pub struct MetadataPaths {
    pub signal_table: PathBuf,
    pub casualty_table: PathBuf,
    pub portal_table: PathBuf,
}

impl MetadataPaths {
    /// The standard project layout.
    pub fn for_project(project_root: &Path, typhoon_dir: &Path) -> Self {
        Self {
            signal_table: typhoon_dir.join("time_of_signal_8.md"),
            casualty_table: typhoon_dir.join("casualty_and_lost_of_signal_8.md"),
            portal_table: project_root.join("# HKO Signal 8 Transparency Portal.md"),
        }
    }
}

fn read_table(path: &Path, header: &[&str], required: bool) -> Result<Vec<TableRow>, IngestError> {
    if !required && !path.exists() {
        logging::warn(
            Stage::Metadata,
            None,
            &format!("{} not found, continuing without it", path.display()),
        );
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
    match parse_markdown_table(&text, header) {
        Some(rows) => Ok(rows),
        None if required => Err(IngestError::TableNotFound {
            path: path.to_path_buf(),
            header: header.join(" | "),
        }),
        None => {
            logging::warn(
                Stage::Metadata,
                None,
                &format!("{} has no matching table, continuing without it", path.display()),
            );
            Ok(Vec::new())
        }
    }
}

/// Loads and merges the metadata tables. The Signal 8 table is required;
/// the portal and casualty tables are optional.
pub fn load_metadata(
    paths: &MetadataPaths,
) -> Result<BTreeMap<String, EventMetadata>, IngestError> {
    let signal_rows = read_table(&paths.signal_table, SIGNAL_HEADER, true)?;
    let casualty_rows = read_table(&paths.casualty_table, CASUALTY_HEADER, false)?;
    let portal_rows = read_table(&paths.portal_table, PORTAL_EVENT_HEADER, false)?;

    let metadata = build_metadata(&signal_rows, &portal_rows, &casualty_rows);
    logging::info(
        Stage::Metadata,
        None,
        &format!("loaded metadata for {} events", metadata.len()),
    );
    Ok(metadata)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
