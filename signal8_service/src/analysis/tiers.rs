//! Tier classification.
//!
//! Phase 1 looks for a persistence window long enough to count on its own
//! (Tier 1). Failing that, phase 2 runs the burst–lull–reemergence automaton
//! over the raw intervals (Tier 2). Anything else is unverified (Tier 3).
//!
//! # First match, not best match
//! The automaton commits to the first qualifying interval as the burst and
//! stops for good as soon as the first reemergence run breaks. A stronger
//! pattern later in the event is never considered. Historical tier
//! assignments depend on this, so it must stay that way.

use crate::analysis::timeline::validate_timeline;
use crate::analysis::windows::{OpenWindow, detect_windows, is_tier1_window};
use crate::config::ClassifierConfig;
use crate::model::{ClassifyError, IntervalReading, Tier2Pattern, TierResult, TierVerdict};

// ---------------------------------------------------------------------------
// Tier 2 automaton
// ---------------------------------------------------------------------------

/// State of the burst–lull–reemergence scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Tier2State {
    Searching,
    Burst {
        burst: OpenWindow,
    },
    Lull {
        burst: OpenWindow,
        lull: OpenWindow,
    },
    Reemergence {
        burst: OpenWindow,
        lull: OpenWindow,
        reemergence: OpenWindow,
    },
    /// The reemergence run broke. Absorbing.
    Done {
        burst: OpenWindow,
        lull: OpenWindow,
        reemergence: OpenWindow,
    },
}

impl Tier2State {
    /// Pure transition on one interval and whether it qualifies.
    pub fn step(self, interval: &IntervalReading, qualifies: bool) -> Tier2State {
        match (self, qualifies) {
            (Tier2State::Searching, true) => Tier2State::Burst {
                burst: OpenWindow::open(interval),
            },
            (Tier2State::Searching, false) => Tier2State::Searching,

            (Tier2State::Burst { burst }, true) => Tier2State::Burst {
                burst: burst.extend(interval),
            },
            (Tier2State::Burst { burst }, false) => Tier2State::Lull {
                burst,
                lull: OpenWindow::open(interval),
            },

            (Tier2State::Lull { burst, lull }, false) => Tier2State::Lull {
                burst,
                lull: lull.extend(interval),
            },
            (Tier2State::Lull { burst, lull }, true) => Tier2State::Reemergence {
                burst,
                lull,
                reemergence: OpenWindow::open(interval),
            },

            (
                Tier2State::Reemergence {
                    burst,
                    lull,
                    reemergence,
                },
                true,
            ) => Tier2State::Reemergence {
                burst,
                lull,
                reemergence: reemergence.extend(interval),
            },
            (
                Tier2State::Reemergence {
                    burst,
                    lull,
                    reemergence,
                },
                false,
            ) => Tier2State::Done {
                burst,
                lull,
                reemergence,
            },

            (done @ Tier2State::Done { .. }, _) => done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Tier2State::Done { .. })
    }

    /// The pattern, if the scan got as far as a reemergence.
    pub fn into_pattern(self, interval_minutes: i64) -> Option<Tier2Pattern> {
        match self {
            Tier2State::Reemergence {
                burst,
                lull,
                reemergence,
            }
            | Tier2State::Done {
                burst,
                lull,
                reemergence,
            } => Some(Tier2Pattern {
                initial_burst: burst.close_span(interval_minutes),
                lull: lull.close_span(interval_minutes),
                reemergence: reemergence.close_span(interval_minutes),
            }),
            _ => None,
        }
    }
}

/// Runs the automaton over the whole timeline, stopping once it is done.
pub fn scan_tier2(readings: &[IntervalReading], config: &ClassifierConfig) -> Option<Tier2Pattern> {
    let mut state = Tier2State::Searching;
    for interval in readings {
        state = state.step(interval, interval.qualifies(config.min_station_count));
        if state.is_done() {
            break;
        }
    }
    state.into_pattern(config.interval_minutes)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classifies a validated timeline.
///
/// Fails with `NoData` on an empty timeline and with `OutOfOrder` when
/// timestamps are not strictly ascending; it never sorts on its own.
pub fn classify(
    readings: &[IntervalReading],
    config: &ClassifierConfig,
) -> Result<TierResult, ClassifyError> {
    validate_timeline(readings)?;
    let persistence_windows = detect_windows(readings, config);

    if let Some(window) = persistence_windows
        .iter()
        .find(|w| is_tier1_window(w, config))
        .cloned()
    {
        return Ok(TierResult {
            initial_detection: Some(window.start),
            verdict: TierVerdict::Tier1 { window },
            persistence_windows,
        });
    }

    if let Some(pattern) = scan_tier2(readings, config) {
        return Ok(TierResult {
            initial_detection: Some(pattern.initial_burst.start),
            verdict: TierVerdict::Tier2(pattern),
            persistence_windows,
        });
    }

    Ok(TierResult {
        verdict: TierVerdict::Tier3,
        initial_detection: None,
        persistence_windows,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
