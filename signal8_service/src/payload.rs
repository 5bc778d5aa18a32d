//! Published JSON records.
//!
//! Plain serializable structs for `events/<id>.json` and `index.json`. They
//! carry no behaviour beyond construction from the classifier's output.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ClassifierConfig;
use crate::ingest::metadata::{Casualty, EventMetadata, PropertyLoss};
use crate::model::{
    DerivedMetrics, EventClassification, IntervalReading, PersistenceWindow, StationReading,
    Tier2Pattern, Timestamp, serialize_optional_timestamp, serialize_timestamp, tier_label,
};

// ---------------------------------------------------------------------------
// Event payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMetadata {
    pub id: String,
    pub name_en: String,
    pub name_zh: String,
    pub year: Option<i32>,
    pub severity: String,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub official_signal8_start: Option<Timestamp>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub official_signal8_end: Option<Timestamp>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub official_signal10_start: Option<Timestamp>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub official_signal10_end: Option<Timestamp>,
    pub notes: Vec<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalPayload {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: Timestamp,
    pub stations_meeting_threshold_count: usize,
    pub meets_tier_threshold: bool,
    pub stations: Vec<StationReading>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationCountPoint {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: Timestamp,
    pub stations_meeting_threshold: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierEvaluation {
    pub detected_tier: u8,
    pub tier_label: &'static str,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub initial_detection: Option<Timestamp>,
    pub persistence_windows: Vec<PersistenceWindow>,
    pub tier1_window: Option<PersistenceWindow>,
    pub tier2_pattern: Option<Tier2Pattern>,
    pub meets_four_station_persistence: bool,
    pub station_count_series: Vec<StationCountPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetricsPayload {
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub persistence_windows: Vec<PersistenceWindow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub metadata: PayloadMetadata,
    pub station_readings: Vec<IntervalPayload>,
    pub tier_evaluation: TierEvaluation,
    pub derived_metrics: DerivedMetricsPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub casualty: Option<Casualty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_loss: Option<PropertyLoss>,
    pub tier: u8,
    pub highlights: Vec<String>,
}

pub fn build_event_payload(
    meta: &EventMetadata,
    readings: &[IntervalReading],
    classification: &EventClassification,
    config: &ClassifierConfig,
) -> EventPayload {
    let tier = &classification.tier;

    let station_readings = readings
        .iter()
        .map(|interval| IntervalPayload {
            timestamp: interval.timestamp,
            stations_meeting_threshold_count: interval.qualifying_count,
            meets_tier_threshold: interval.qualifies(config.min_station_count),
            stations: interval.stations.clone(),
        })
        .collect();

    let tier_evaluation = TierEvaluation {
        detected_tier: tier.tier(),
        tier_label: tier.verdict.label(),
        initial_detection: tier.initial_detection,
        persistence_windows: tier.persistence_windows.clone(),
        tier1_window: tier.tier1_window().cloned(),
        tier2_pattern: tier.tier2_pattern().cloned(),
        meets_four_station_persistence: tier.tier() == 1,
        station_count_series: readings
            .iter()
            .map(|interval| StationCountPoint {
                timestamp: interval.timestamp,
                stations_meeting_threshold: interval.qualifying_count,
            })
            .collect(),
    };

    EventPayload {
        metadata: PayloadMetadata {
            id: meta.id.clone(),
            name_en: meta.name_en.clone(),
            name_zh: meta.name_zh.clone(),
            year: meta.year,
            severity: meta.severity.clone(),
            official_signal8_start: meta.official_signal8_start,
            official_signal8_end: meta.official_signal8_end,
            official_signal10_start: meta.official_signal10_start,
            official_signal10_end: meta.official_signal10_end,
            notes: meta.notes.clone(),
            highlights: classification.highlights.clone(),
        },
        station_readings,
        tier_evaluation,
        derived_metrics: DerivedMetricsPayload {
            metrics: classification.metrics.clone(),
            persistence_windows: tier.persistence_windows.clone(),
        },
        casualty: meta.casualty.clone(),
        property_loss: meta.property_loss.clone(),
        tier: tier.tier(),
        highlights: classification.highlights.clone(),
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// One row of `index.json`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    pub name_en: String,
    pub name_zh: String,
    pub year: Option<i32>,
    pub tier: u8,
    pub tier_label: &'static str,
    pub severity: String,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub official_signal8_start: Option<Timestamp>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub official_signal8_end: Option<Timestamp>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub official_signal10_start: Option<Timestamp>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub official_signal10_end: Option<Timestamp>,
    pub early_warning_minutes: Option<i64>,
    pub casualty: Option<Casualty>,
    pub property_loss: Option<PropertyLoss>,
    pub highlights: Vec<String>,
}

/// Summaries for every event, oldest official Signal 8 first.
pub fn build_index(payloads: &[EventPayload]) -> Vec<IndexEntry> {
    let mut entries: Vec<IndexEntry> = payloads
        .iter()
        .map(|p| IndexEntry {
            id: p.metadata.id.clone(),
            name_en: p.metadata.name_en.clone(),
            name_zh: p.metadata.name_zh.clone(),
            year: p.metadata.year,
            tier: p.tier,
            tier_label: tier_label(p.tier),
            severity: p.metadata.severity.clone(),
            official_signal8_start: p.metadata.official_signal8_start,
            official_signal8_end: p.metadata.official_signal8_end,
            official_signal10_start: p.metadata.official_signal10_start,
            official_signal10_end: p.metadata.official_signal10_end,
            early_warning_minutes: p.derived_metrics.metrics.early_warning_minutes,
            casualty: p.casualty.clone(),
            property_loss: p.property_loss.clone(),
            highlights: p.highlights.clone(),
        })
        .collect();
    entries.sort_by_key(|e| e.official_signal8_start);
    entries
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum OutputError {
    Io { path: PathBuf, message: String },
    Json(String),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Io { path, message } => {
                write!(f, "I/O error writing {}: {}", path.display(), message)
            }
            OutputError::Json(msg) => write!(f, "JSON serialization error: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {}

/// Pretty-prints `data` to `path`, creating parent directories. Non-ASCII
/// names are written as-is.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), OutputError> {
    let io_err = |e: std::io::Error| OutputError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(data).map_err(|e| OutputError::Json(e.to_string()))?;
    std::fs::write(path, json).map_err(io_err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classify_event;
    use crate::analysis::test_support::{at, series};

    fn meta(id: &str, start: Timestamp) -> EventMetadata {
        EventMetadata {
            id: id.to_string(),
            name_en: "Mangkhut".to_string(),
            name_zh: "山竹".to_string(),
            year: Some(2018),
            severity: "T10".to_string(),
            official_signal8_start: Some(start),
            casualty: Some(Casualty {
                deaths: 0,
                missing: 0,
                injured: 458,
            }),
            ..EventMetadata::default()
        }
    }

    fn payload_for(counts: &[usize], id: &str, start: Timestamp) -> EventPayload {
        let config = ClassifierConfig::default();
        let readings = series(counts);
        let classification = classify_event(&readings, start, &config).expect("valid timeline");
        build_event_payload(&meta(id, start), &readings, &classification, &config)
    }

    #[test]
    fn test_event_payload_json_shape() {
        let payload = payload_for(&[0, 5, 5, 5], "mangkhut", at(0));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["tier"], 1);
        assert_eq!(json["metadata"]["nameZh"], "山竹");
        assert_eq!(json["metadata"]["officialSignal8Start"], "2018-09-16T08:00+08:00");
        assert!(json["metadata"]["officialSignal10Start"].is_null());
        assert_eq!(json["tierEvaluation"]["tierLabel"], "Tier 1: Sustained T8 Wind Speed Verified");
        assert_eq!(json["tierEvaluation"]["meetsFourStationPersistence"], true);
        assert_eq!(json["tierEvaluation"]["tier1Window"]["minutes"], 30);
        assert!(json["tierEvaluation"]["tier2Pattern"].is_null());
        assert_eq!(json["tierEvaluation"]["stationCountSeries"][1]["stationsMeetingThreshold"], 5);
        assert_eq!(json["derivedMetrics"]["earlyWarningMinutes"], 10);
        assert_eq!(json["derivedMetrics"]["persistenceWindows"][0]["intervalCount"], 3);
        assert_eq!(json["derivedMetrics"]["peakStation"]["stationId"], "cheung-chau");
        assert_eq!(json["stationReadings"][0]["meetsTierThreshold"], false);
        assert_eq!(json["stationReadings"][0]["stations"][0]["meanSpeedKmh"], 30.0);
        assert_eq!(json["casualty"]["injured"], 458);
        assert!(json.get("propertyLoss").is_none(), "absent property loss is omitted");
    }

    #[test]
    fn test_tier3_payload_has_null_detection_and_evidence() {
        let payload = payload_for(&[1, 1], "mangkhut", at(0));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["tier"], 3);
        assert!(json["tierEvaluation"]["initialDetection"].is_null());
        assert!(json["tierEvaluation"]["tier1Window"].is_null());
        assert!(json["tierEvaluation"]["tier2Pattern"].is_null());
        assert!(json["derivedMetrics"]["earlyWarningMinutes"].is_null());
    }

    #[test]
    fn test_tier2_pattern_uses_initial_burst_key() {
        let payload = payload_for(&[5, 0, 5], "mangkhut", at(0));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["tierEvaluation"]["tier2Pattern"]["initialBurst"]["intervalCount"], 1);
        assert_eq!(json["tierEvaluation"]["meetsFourStationPersistence"], false);
    }

    #[test]
    fn test_index_is_sorted_by_official_start() {
        let later = payload_for(&[5, 5, 5], "later", at(10));
        let earlier = payload_for(&[1], "earlier", at(0));
        let index = build_index(&[later, earlier]);

        let ids: Vec<_> = index.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["earlier", "later"]);
        assert_eq!(index[0].tier_label, "Tier 3: Unverified");
        assert_eq!(index[1].early_warning_minutes, Some(-100));
    }
}
