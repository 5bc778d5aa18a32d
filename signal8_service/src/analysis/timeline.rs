//! Timeline building and threshold evaluation.
//!
//! Turns the raw per-timestamp, per-station cells into one `IntervalReading`
//! per timestamp, each carrying all eight reference stations in canonical
//! order. Missing stations and unreadable values become `None`; nothing is
//! imputed or interpolated.

use crate::config::ClassifierConfig;
use crate::model::{ClassifyError, IntervalReading, RawTimeline, RawWindSample, StationReading};
use crate::stations::{REFERENCE_STATIONS, ReferenceStation};

/// Parses a raw wind cell. Blank, "N/A", non-numeric and NaN values all
/// yield `None`. "inf" is kept and clears any threshold.
pub fn parse_speed(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("N/A") {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Mean wind alone decides the threshold test; gust is descriptive only.
pub fn meets_threshold(mean_speed: Option<f64>, config: &ClassifierConfig) -> bool {
    mean_speed.is_some_and(|mean| mean >= config.wind_threshold_kmh)
}

fn station_reading(
    station: &ReferenceStation,
    sample: Option<&RawWindSample>,
    config: &ClassifierConfig,
) -> StationReading {
    let mean_speed = sample.and_then(|s| s.mean.as_deref()).and_then(parse_speed);
    let gust_speed = sample.and_then(|s| s.gust.as_deref()).and_then(parse_speed);
    StationReading {
        station_id: station.station_id.to_string(),
        name_en: station.name_en.to_string(),
        name_zh: station.name_zh.to_string(),
        mean_speed,
        gust_speed,
        meets_threshold: meets_threshold(mean_speed, config),
    }
}

/// Builds the ordered interval sequence. One interval per raw timestamp,
/// ascending; stations outside the reference network are ignored.
pub fn build_timeline(raw: &RawTimeline, config: &ClassifierConfig) -> Vec<IntervalReading> {
    raw.iter()
        .map(|(timestamp, cells)| {
            let stations: Vec<StationReading> = REFERENCE_STATIONS
                .iter()
                .map(|station| station_reading(station, cells.get(station.csv_name), config))
                .collect();
            let qualifying_count = stations.iter().filter(|s| s.meets_threshold).count();
            IntervalReading {
                timestamp: *timestamp,
                stations,
                qualifying_count,
            }
        })
        .collect()
}

/// Checks the classifier's preconditions: at least one interval, and
/// timestamps strictly ascending. The sequence is never reordered here.
pub fn validate_timeline(readings: &[IntervalReading]) -> Result<(), ClassifyError> {
    if readings.is_empty() {
        return Err(ClassifyError::NoData);
    }
    for pair in readings.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(ClassifyError::OutOfOrder {
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HKT, Timestamp};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn at(hour: u32, minute: u32) -> Timestamp {
        HKT.with_ymd_and_hms(2018, 9, 16, hour, minute, 0).unwrap()
    }

    fn sample(mean: &str, gust: &str) -> RawWindSample {
        RawWindSample {
            mean: Some(mean.to_string()),
            gust: Some(gust.to_string()),
        }
    }

    // --- parse_speed --------------------------------------------------------

    #[test]
    fn test_parse_speed_accepts_plain_numbers() {
        assert_eq!(parse_speed("63"), Some(63.0));
        assert_eq!(parse_speed(" 72.5 "), Some(72.5));
    }

    #[test]
    fn test_parse_speed_degrades_junk_to_none() {
        assert_eq!(parse_speed(""), None);
        assert_eq!(parse_speed("N/A"), None);
        assert_eq!(parse_speed("n/a"), None);
        assert_eq!(parse_speed("calm"), None);
        assert_eq!(parse_speed("NaN"), None);
    }

    #[test]
    fn test_parse_speed_keeps_infinity_above_threshold() {
        let speed = parse_speed("inf");
        assert_eq!(speed, Some(f64::INFINITY));
        assert!(meets_threshold(speed, &ClassifierConfig::default()));
    }

    // --- threshold ----------------------------------------------------------

    #[test]
    fn test_threshold_is_inclusive() {
        let config = ClassifierConfig::default();
        assert!(meets_threshold(Some(63.0), &config));
        assert!(!meets_threshold(Some(62.9), &config));
        assert!(!meets_threshold(None, &config));
    }

    // --- build_timeline -----------------------------------------------------

    #[test]
    fn test_every_interval_carries_all_reference_stations_in_order() {
        let mut raw = RawTimeline::new();
        raw.insert(at(10, 0), HashMap::from([("Sha Tin".to_string(), sample("70", "95"))]));

        let timeline = build_timeline(&raw, &ClassifierConfig::default());
        assert_eq!(timeline.len(), 1);
        let ids: Vec<_> = timeline[0].stations.iter().map(|s| s.station_id.as_str()).collect();
        let expected: Vec<_> = REFERENCE_STATIONS.iter().map(|s| s.station_id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_absent_station_is_null_and_not_qualifying() {
        let mut raw = RawTimeline::new();
        raw.insert(at(10, 0), HashMap::from([("Sha Tin".to_string(), sample("70", "95"))]));

        let timeline = build_timeline(&raw, &ClassifierConfig::default());
        let kai_tak = &timeline[0].stations[2];
        assert_eq!(kai_tak.station_id, "kai-tak");
        assert_eq!(kai_tak.mean_speed, None);
        assert_eq!(kai_tak.gust_speed, None);
        assert!(!kai_tak.meets_threshold);
        assert_eq!(timeline[0].qualifying_count, 1);
    }

    #[test]
    fn test_gust_alone_never_meets_threshold() {
        let mut raw = RawTimeline::new();
        raw.insert(at(10, 0), HashMap::from([("Kai Tak".to_string(), sample("40", "120"))]));

        let timeline = build_timeline(&raw, &ClassifierConfig::default());
        assert_eq!(timeline[0].stations[2].gust_speed, Some(120.0));
        assert_eq!(timeline[0].qualifying_count, 0);
    }

    #[test]
    fn test_non_numeric_mean_degrades_without_halting() {
        let mut raw = RawTimeline::new();
        raw.insert(
            at(10, 0),
            HashMap::from([
                ("Kai Tak".to_string(), sample("***", "80")),
                ("Tsing Yi".to_string(), sample("65", "80")),
            ]),
        );

        let timeline = build_timeline(&raw, &ClassifierConfig::default());
        assert_eq!(timeline[0].stations[2].mean_speed, None);
        assert_eq!(timeline[0].stations[7].mean_speed, Some(65.0));
        assert_eq!(timeline[0].qualifying_count, 1);
    }

    #[test]
    fn test_non_reference_station_is_ignored() {
        let mut raw = RawTimeline::new();
        raw.insert(
            at(10, 0),
            HashMap::from([("Waglan Island".to_string(), sample("110", "140"))]),
        );

        let timeline = build_timeline(&raw, &ClassifierConfig::default());
        assert_eq!(timeline[0].qualifying_count, 0);
        assert!(timeline[0].stations.iter().all(|s| s.mean_speed.is_none()));
    }

    #[test]
    fn test_qualifying_count_matches_flags() {
        let mut raw = RawTimeline::new();
        let cells: HashMap<_, _> = REFERENCE_STATIONS
            .iter()
            .enumerate()
            .map(|(i, s)| (s.csv_name.to_string(), sample(&format!("{}", 58 + i * 2), "")))
            .collect();
        raw.insert(at(10, 0), cells);

        let timeline = build_timeline(&raw, &ClassifierConfig::default());
        let flagged = timeline[0].stations.iter().filter(|s| s.meets_threshold).count();
        // 58, 60, 62 fall short; 64 through 72 qualify.
        assert_eq!(flagged, 5);
        assert_eq!(timeline[0].qualifying_count, flagged);
    }

    #[test]
    fn test_timeline_is_ascending() {
        let mut raw = RawTimeline::new();
        raw.insert(at(10, 20), HashMap::new());
        raw.insert(at(10, 0), HashMap::new());
        raw.insert(at(10, 10), HashMap::new());

        let timeline = build_timeline(&raw, &ClassifierConfig::default());
        let stamps: Vec<_> = timeline.iter().map(|i| i.timestamp).collect();
        assert_eq!(stamps, vec![at(10, 0), at(10, 10), at(10, 20)]);
    }

    // --- validate_timeline --------------------------------------------------

    fn empty_interval(ts: Timestamp) -> IntervalReading {
        IntervalReading {
            timestamp: ts,
            stations: Vec::new(),
            qualifying_count: 0,
        }
    }

    #[test]
    fn test_empty_timeline_is_no_data() {
        assert_eq!(validate_timeline(&[]), Err(ClassifyError::NoData));
    }

    #[test]
    fn test_out_of_order_timeline_is_rejected() {
        let readings = vec![empty_interval(at(10, 10)), empty_interval(at(10, 0))];
        assert_eq!(
            validate_timeline(&readings),
            Err(ClassifyError::OutOfOrder {
                previous: at(10, 10),
                current: at(10, 0),
            })
        );
    }

    #[test]
    fn test_duplicate_timestamp_is_rejected() {
        let readings = vec![empty_interval(at(10, 0)), empty_interval(at(10, 0))];
        assert!(matches!(
            validate_timeline(&readings),
            Err(ClassifyError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_single_interval_is_valid() {
        assert!(validate_timeline(&[empty_interval(at(10, 0))]).is_ok());
    }
}
