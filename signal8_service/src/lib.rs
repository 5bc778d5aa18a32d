/// signal8_service: Hong Kong Signal 8 corroboration against observed winds.
///
/// # Module structure
///
/// ```text
/// signal8_service
/// ├── model     — shared data types (StationReading, PersistenceWindow, TierResult, ClassifyError, …)
/// ├── stations  — the eight reference anemometer stations
/// ├── config    — classifier thresholds from defaults, TOML and environment
/// ├── logging   — stage-tagged console/file logging
/// ├── ingest
/// │   ├── csv      — HKO 10-minute wind CSVs
/// │   └── metadata — Signal 8, portal and casualty markdown tables
/// ├── analysis
/// │   ├── timeline — raw cells into threshold-tagged intervals
/// │   ├── windows  — persistence windows
/// │   ├── tiers    — Tier 1 / Tier 2 / Tier 3 classification
/// │   └── metrics  — early warning, peak wind, highlights
/// ├── payload   — published JSON records
/// └── events    — folder discovery and the build pipeline
/// ```

pub mod analysis;
pub mod config;
pub mod events;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod payload;
pub mod stations;
