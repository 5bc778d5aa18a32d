//! StationReading, IntervalReading, PersistenceWindow, TierResult, DerivedMetrics,
//! ClassifyError: core data structures and error handling
//!
//! Core data types for the Signal 8 corroboration service.
//!
//! This module defines the shared domain model imported by all other modules.
//! It contains no logic beyond small accessors, no I/O, and no dependencies
//! other than chrono and serde derives.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Every observation and official signal time is carried in Hong Kong Time.
pub type Timestamp = DateTime<FixedOffset>;

/// Hong Kong Time, UTC+08:00.
pub const HKT: FixedOffset = match FixedOffset::east_opt(8 * 3600) {
    Some(offset) => offset,
    None => panic!("UTC+08:00 is a valid fixed offset"),
};

/// Minute-precision ISO 8601, e.g. "2023-09-01T14:40+08:00".
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M%:z";

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn serialize_timestamp<S: Serializer>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

pub(crate) fn serialize_optional_timestamp<S: Serializer>(
    ts: &Option<Timestamp>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => s.serialize_str(&format_timestamp(ts)),
        None => s.serialize_none(),
    }
}

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// One station's raw wind cell for one timestamp, exactly as ingested.
///
/// Values stay textual until the timeline builder parses them, so that
/// "N/A", blanks and other junk degrade to `None` in one place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWindSample {
    pub mean: Option<String>,
    pub gust: Option<String>,
}

/// timestamp -> raw station name -> sample. Station names are the CSV names.
pub type RawTimeline = BTreeMap<Timestamp, HashMap<String, RawWindSample>>;

// ---------------------------------------------------------------------------
// Timeline types
// ---------------------------------------------------------------------------

/// A single reference station's wind reading within one 10-minute interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReading {
    pub station_id: String,
    pub name_en: String,
    pub name_zh: String,
    #[serde(rename = "meanSpeedKmh")]
    pub mean_speed: Option<f64>,
    #[serde(rename = "gustKmh")]
    pub gust_speed: Option<f64>,
    pub meets_threshold: bool,
}

/// One observation slot across the whole reference network.
///
/// `stations` always holds one entry per reference station, in registry
/// order, whether or not the station reported.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalReading {
    pub timestamp: Timestamp,
    pub stations: Vec<StationReading>,
    pub qualifying_count: usize,
}

impl IntervalReading {
    /// True when enough stations met the wind threshold in this slot.
    pub fn qualifies(&self, min_station_count: usize) -> bool {
        self.qualifying_count >= min_station_count
    }
}

// ---------------------------------------------------------------------------
// Classification types
// ---------------------------------------------------------------------------

/// A run of consecutive intervals, inclusive at both ends.
///
/// `max_station_count` is set for persistence windows and left empty on
/// Tier 2 spans, where a lull's count would be below the minimum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceWindow {
    #[serde(serialize_with = "serialize_timestamp")]
    pub start: Timestamp,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end: Timestamp,
    pub interval_count: usize,
    pub minutes: i64,
    pub max_station_count: Option<usize>,
}

/// Burst, lull and reemergence spans of a Tier 2 detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier2Pattern {
    pub initial_burst: PersistenceWindow,
    pub lull: PersistenceWindow,
    pub reemergence: PersistenceWindow,
}

/// Which corroboration tier fired, with the evidence that made it fire.
#[derive(Debug, Clone, PartialEq)]
pub enum TierVerdict {
    /// Sustained persistence: the first window long enough to count.
    Tier1 { window: PersistenceWindow },
    /// Burst, lull, reemergence.
    Tier2(Tier2Pattern),
    /// Unverified.
    Tier3,
}

impl TierVerdict {
    pub fn tier(&self) -> u8 {
        match self {
            TierVerdict::Tier1 { .. } => 1,
            TierVerdict::Tier2(_) => 2,
            TierVerdict::Tier3 => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        tier_label(self.tier())
    }
}

/// Human-facing label for a tier number.
pub fn tier_label(tier: u8) -> &'static str {
    match tier {
        1 => "Tier 1: Sustained T8 Wind Speed Verified",
        2 => "Tier 2: Reappear T8 Wind Speed Verified",
        _ => "Tier 3: Unverified",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierResult {
    pub verdict: TierVerdict,
    pub initial_detection: Option<Timestamp>,
    /// Every persistence window in the event, whichever tier fired.
    pub persistence_windows: Vec<PersistenceWindow>,
}

impl TierResult {
    pub fn tier(&self) -> u8 {
        self.verdict.tier()
    }

    pub fn tier1_window(&self) -> Option<&PersistenceWindow> {
        match &self.verdict {
            TierVerdict::Tier1 { window } => Some(window),
            _ => None,
        }
    }

    pub fn tier2_pattern(&self) -> Option<&Tier2Pattern> {
        match &self.verdict {
            TierVerdict::Tier2(pattern) => Some(pattern),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

/// The strongest mean wind seen anywhere in the event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakStation {
    pub station_id: String,
    pub name_en: String,
    pub name_zh: String,
    pub speed: f64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    /// Positive when the official signal came first.
    pub early_warning_minutes: Option<i64>,
    pub total_intervals: usize,
    pub intervals_meeting_threshold: usize,
    pub longest_persistence_minutes: i64,
    pub peak_station: Option<PeakStation>,
}

/// Everything the classifier says about one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventClassification {
    pub tier: TierResult,
    pub metrics: DerivedMetrics,
    pub highlights: Vec<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Precondition failures that make a timeline un-classifiable.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyError {
    /// The event produced no intervals at all.
    NoData,
    /// Timestamps are not strictly ascending (out of order or duplicated).
    OutOfOrder { previous: Timestamp, current: Timestamp },
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifyError::NoData => write!(f, "No data: timeline contains no intervals"),
            ClassifyError::OutOfOrder { previous, current } => write!(
                f,
                "Ordering error: interval {} does not follow {}",
                format_timestamp(current),
                format_timestamp(previous)
            ),
        }
    }
}

impl std::error::Error for ClassifyError {}
