//! Persistence window detection.
//!
//! A persistence window is a maximal run of consecutive qualifying
//! intervals. Windows come out chronologically ordered and never touch:
//! at least one non-qualifying interval separates any two of them.

use crate::config::ClassifierConfig;
use crate::model::{IntervalReading, PersistenceWindow, Timestamp};

/// A run of intervals still being extended.
///
/// Shared with the Tier 2 automaton, whose burst, lull and reemergence
/// spans are tracked the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenWindow {
    pub start: Timestamp,
    pub end: Timestamp,
    pub interval_count: usize,
    pub max_station_count: usize,
}

impl OpenWindow {
    pub fn open(interval: &IntervalReading) -> Self {
        Self {
            start: interval.timestamp,
            end: interval.timestamp,
            interval_count: 1,
            max_station_count: interval.qualifying_count,
        }
    }

    pub fn extend(mut self, interval: &IntervalReading) -> Self {
        self.end = interval.timestamp;
        self.interval_count += 1;
        self.max_station_count = self.max_station_count.max(interval.qualifying_count);
        self
    }

    pub fn close(self, interval_minutes: i64) -> PersistenceWindow {
        let max_station_count = self.max_station_count;
        PersistenceWindow {
            max_station_count: Some(max_station_count),
            ..self.close_span(interval_minutes)
        }
    }

    /// Closes a Tier 2 span, which carries no station count.
    pub fn close_span(self, interval_minutes: i64) -> PersistenceWindow {
        PersistenceWindow {
            start: self.start,
            end: self.end,
            interval_count: self.interval_count,
            minutes: self.interval_count as i64 * interval_minutes,
            max_station_count: None,
        }
    }
}

/// Single forward scan grouping qualifying intervals into windows.
pub fn detect_windows(
    readings: &[IntervalReading],
    config: &ClassifierConfig,
) -> Vec<PersistenceWindow> {
    let mut windows = Vec::new();
    let mut current: Option<OpenWindow> = None;

    for interval in readings {
        if interval.qualifies(config.min_station_count) {
            current = Some(match current.take() {
                None => OpenWindow::open(interval),
                Some(open) => open.extend(interval),
            });
        } else if let Some(open) = current.take() {
            windows.push(open.close(config.interval_minutes));
        }
    }
    if let Some(open) = current {
        windows.push(open.close(config.interval_minutes));
    }

    windows
}

/// Long enough to count as Tier 1 persistence on its own.
pub fn is_tier1_window(window: &PersistenceWindow, config: &ClassifierConfig) -> bool {
    window.interval_count >= config.min_persistence_intervals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
