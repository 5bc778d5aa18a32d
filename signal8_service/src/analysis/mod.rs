//! Signal 8 corroboration analysis.
//!
//! Pure, synchronous transforms over one event's timeline. Nothing here
//! performs I/O or logs, so events can be classified independently and in
//! any order.
//!
//! Submodules, in pipeline order:
//! - `timeline` — raw station cells into ordered, threshold-tagged intervals.
//! - `windows`  — consecutive qualifying intervals into persistence windows.
//! - `tiers`    — Tier 1 check, then the Tier 2 burst–lull–reemergence automaton.
//! - `metrics`  — early warning, peak wind, highlight sentences.

pub mod metrics;
pub mod tiers;
pub mod timeline;
pub mod windows;

use crate::config::ClassifierConfig;
use crate::model::{ClassifyError, EventClassification, IntervalReading, Timestamp};

/// Classifies one event's timeline against its official Signal 8 start.
pub fn classify_event(
    readings: &[IntervalReading],
    official_start: Timestamp,
    config: &ClassifierConfig,
) -> Result<EventClassification, ClassifyError> {
    let tier = tiers::classify(readings, config)?;
    let metrics = metrics::derive_metrics(readings, &tier, official_start, config);
    let highlights = metrics::generate_highlights(&tier, &metrics, config);
    Ok(EventClassification {
        tier,
        metrics,
        highlights,
    })
}
