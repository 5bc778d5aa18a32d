//! Derived metrics and highlight sentences.

use crate::config::ClassifierConfig;
use crate::model::{
    DerivedMetrics, IntervalReading, PeakStation, TierResult, TierVerdict, Timestamp,
    format_timestamp,
};
use crate::stations::REFERENCE_STATION_COUNT;

// ---------------------------------------------------------------------------
// Early warning
// ---------------------------------------------------------------------------

/// Signed minutes from the official signal to the first detection, floored.
///
/// Positive: the official signal came first. Negative: observations came
/// first. `None` when nothing was detected.
pub fn early_warning_minutes(
    initial_detection: Option<Timestamp>,
    official_start: Timestamp,
) -> Option<i64> {
    initial_detection.map(|detected| (detected - official_start).num_seconds().div_euclid(60))
}

// ---------------------------------------------------------------------------
// Peak wind
// ---------------------------------------------------------------------------

/// Highest non-null mean speed in the timeline.
///
/// Only a strictly higher reading replaces the current peak, so ties go to
/// the earliest interval and then to the station listed first.
pub fn find_peak_station(readings: &[IntervalReading]) -> Option<PeakStation> {
    let mut peak: Option<PeakStation> = None;
    for interval in readings {
        for station in &interval.stations {
            let Some(speed) = station.mean_speed else {
                continue;
            };
            if peak.as_ref().is_none_or(|p| speed > p.speed) {
                peak = Some(PeakStation {
                    station_id: station.station_id.clone(),
                    name_en: station.name_en.clone(),
                    name_zh: station.name_zh.clone(),
                    speed,
                    timestamp: interval.timestamp,
                });
            }
        }
    }
    peak
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

pub fn derive_metrics(
    readings: &[IntervalReading],
    tier: &TierResult,
    official_start: Timestamp,
    config: &ClassifierConfig,
) -> DerivedMetrics {
    DerivedMetrics {
        early_warning_minutes: early_warning_minutes(tier.initial_detection, official_start),
        total_intervals: readings.len(),
        intervals_meeting_threshold: readings
            .iter()
            .filter(|i| i.qualifies(config.min_station_count))
            .count(),
        longest_persistence_minutes: tier
            .persistence_windows
            .iter()
            .map(|w| w.minutes)
            .max()
            .unwrap_or(0),
        peak_station: find_peak_station(readings),
    }
}

// ---------------------------------------------------------------------------
// Highlights
// ---------------------------------------------------------------------------

fn tier_sentence(tier: &TierResult, config: &ClassifierConfig) -> String {
    match &tier.verdict {
        TierVerdict::Tier1 { window } => format!(
            "Tier 1 persistence detected for {} min starting {} ({}/{} stations ≥{} km/h).",
            window.minutes,
            format_timestamp(&window.start),
            window.max_station_count.unwrap_or_default(),
            REFERENCE_STATION_COUNT,
            config.wind_threshold_kmh
        ),
        TierVerdict::Tier2(pattern) => format!(
            "Tier 2 wind-lull-wind pattern: burst {} to {}, lull {} to {}, reemergence {} to {}.",
            format_timestamp(&pattern.initial_burst.start),
            format_timestamp(&pattern.initial_burst.end),
            format_timestamp(&pattern.lull.start),
            format_timestamp(&pattern.lull.end),
            format_timestamp(&pattern.reemergence.start),
            format_timestamp(&pattern.reemergence.end)
        ),
        TierVerdict::Tier3 => format!(
            "Tier 3 (unverified): no ≥{} min persistence detected across the reference network.",
            config.min_persistence_minutes()
        ),
    }
}

fn early_warning_sentence(minutes: i64) -> String {
    match minutes {
        m if m > 0 => format!("HKO issued T8 {} min before sustained gales were observed.", m),
        m if m < 0 => format!("Sustained gales arrived {} min before HKO's T8.", m.abs()),
        _ => "Observed persistence began at the same time as the official T8 issuance.".to_string(),
    }
}

fn peak_sentence(peak: &PeakStation) -> String {
    format!(
        "Peak mean wind {} km/h at {} ({}).",
        peak.speed.round_ties_even() as i64,
        peak.name_en,
        format_timestamp(&peak.timestamp)
    )
}

/// Tier sentence, then early-warning sentence when there is one, then the
/// peak wind sentence when any station reported.
pub fn generate_highlights(
    tier: &TierResult,
    metrics: &DerivedMetrics,
    config: &ClassifierConfig,
) -> Vec<String> {
    let mut highlights = vec![tier_sentence(tier, config)];
    if let Some(minutes) = metrics.early_warning_minutes {
        highlights.push(early_warning_sentence(minutes));
    }
    if let Some(peak) = &metrics.peak_station {
        highlights.push(peak_sentence(peak));
    }
    highlights
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
