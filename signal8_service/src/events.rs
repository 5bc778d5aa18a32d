//! Event discovery and the build pipeline.
//!
//! Ties ingest, classification and payload writing together: one folder of
//! CSVs per typhoon, one `events/<id>.json` per classified event, and a
//! single `index.json` at the end.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::classify_event;
use crate::analysis::timeline::build_timeline;
use crate::config::{ClassifierConfig, ConfigError};
use crate::ingest::IngestError;
use crate::ingest::csv::{CsvLoadStats, load_event_directory};
use crate::ingest::metadata::{EventMetadata, MetadataPaths, load_metadata, slugify};
use crate::logging::{self, Stage};
use crate::model::ClassifyError;
use crate::payload::{EventPayload, OutputError, build_event_payload, build_index, write_json};

static EVENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-A-Za-z]+").expect("EVENT_NAME_RE regex should compile"));

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures that abort a whole build. Per-event problems are skipped and
/// logged instead.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    Config(ConfigError),
    Ingest(IngestError),
    Output(OutputError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Config(e) => write!(f, "Configuration error: {}", e),
            BuildError::Ingest(e) => write!(f, "Ingest error: {}", e),
            BuildError::Output(e) => write!(f, "Output error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        BuildError::Config(e)
    }
}

impl From<IngestError> for BuildError {
    fn from(e: IngestError) -> Self {
        BuildError::Ingest(e)
    }
}

impl From<OutputError> for BuildError {
    fn from(e: OutputError) -> Self {
        BuildError::Output(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Event id for a data folder name: the slug of its first letter run.
///
/// "201822_Mangkhut" -> "mangkhut". Names without letters yield `None`.
pub fn event_id_for_dir_name(name: &str) -> Option<String> {
    let run = EVENT_NAME_RE.find(name)?;
    let id = slugify(run.as_str());
    (!id.is_empty()).then_some(id)
}

/// Maps event id to folder for every subdirectory of `typhoon_root`.
///
/// When two folders share an id, the one whose name sorts last wins.
pub fn discover_event_directories(
    typhoon_root: &Path,
) -> Result<BTreeMap<String, PathBuf>, IngestError> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(typhoon_root)
        .map_err(|e| IngestError::io(typhoon_root, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let mut events = BTreeMap::new();
    for dir in dirs {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match event_id_for_dir_name(name) {
            Some(id) => {
                events.insert(id, dir);
            }
            None => logging::debug(
                Stage::System,
                None,
                &format!("ignoring folder {} (no event name)", dir.display()),
            ),
        }
    }
    Ok(events)
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Holds the portal markdown file.
    pub project_root: PathBuf,
    /// One subfolder of CSVs per event, plus the signal and casualty tables.
    pub typhoon_dir: PathBuf,
    /// Receives `index.json` and `events/`.
    pub output_dir: PathBuf,
    pub config: ClassifierConfig,
}

impl BuildOptions {
    /// Relative data and output folders are taken from `project_root`.
    pub fn new(
        project_root: &Path,
        typhoon_dir: &Path,
        output_dir: &Path,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            typhoon_dir: project_root.join(typhoon_dir),
            output_dir: project_root.join(output_dir),
            config,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildSummary {
    pub discovered: usize,
    /// Ids of events written to `events/`, in id order.
    pub built: Vec<String>,
    /// (id, reason) for every discovered event that was not written.
    pub skipped: Vec<(String, String)>,
}

/// Why a single event was left out of the build.
enum Skip {
    NoMetadata,
    NoOfficialStart,
    /// The event folder or one of its CSVs could not be read.
    Ingest(IngestError),
    Classify(ClassifyError),
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skip::NoMetadata => write!(f, "metadata missing"),
            Skip::NoOfficialStart => write!(f, "no official Signal 8 start"),
            Skip::Ingest(e) => write!(f, "{}", e),
            Skip::Classify(ClassifyError::NoData) => write!(f, "no usable CSV rows"),
            Skip::Classify(e) => write!(f, "{}", e),
        }
    }
}

fn log_csv_stats(id: &str, stats: &CsvLoadStats) {
    let message = format!(
        "{} files, {} rows, {} reference rows, {} skipped",
        stats.files, stats.rows, stats.reference_rows, stats.skipped_rows
    );
    if stats.skipped_rows > 0 {
        logging::warn(Stage::Csv, Some(id), &message);
    } else {
        logging::debug(Stage::Csv, Some(id), &message);
    }
}

fn build_event(
    id: &str,
    dir: &Path,
    meta: Option<&EventMetadata>,
    config: &ClassifierConfig,
) -> Result<EventPayload, Skip> {
    let meta = meta.ok_or(Skip::NoMetadata)?;
    let official_start = meta.official_signal8_start.ok_or(Skip::NoOfficialStart)?;

    logging::info(
        Stage::Csv,
        Some(id),
        &format!("processing {}", dir.display()),
    );
    let (raw, stats) = load_event_directory(dir).map_err(Skip::Ingest)?;
    log_csv_stats(id, &stats);
    let readings = build_timeline(&raw, config);

    let classification =
        classify_event(&readings, official_start, config).map_err(Skip::Classify)?;
    logging::info(
        Stage::Classifier,
        Some(id),
        &format!(
            "{} over {} intervals",
            classification.tier.verdict.label(),
            readings.len()
        ),
    );
    Ok(build_event_payload(meta, &readings, &classification, config))
}

/// Runs the whole build: metadata, discovery, per-event classification,
/// event files and the index.
///
/// Only the metadata tables, the typhoon root and output writes are fatal.
/// A folder that cannot be read or classified is skipped with a warning.
pub fn build_all(options: &BuildOptions) -> Result<BuildSummary, BuildError> {
    options.config.validate()?;

    let paths = MetadataPaths::for_project(&options.project_root, &options.typhoon_dir);
    let metadata = load_metadata(&paths)?;
    let event_dirs = discover_event_directories(&options.typhoon_dir)?;

    let events_dir = options.output_dir.join("events");
    let mut summary = BuildSummary {
        discovered: event_dirs.len(),
        ..BuildSummary::default()
    };
    let mut payloads = Vec::new();

    for (id, dir) in &event_dirs {
        match build_event(id, dir, metadata.get(id), &options.config) {
            Ok(payload) => {
                let path = events_dir.join(format!("{}.json", id));
                write_json(&path, &payload)?;
                logging::debug(Stage::Output, Some(id), &format!("wrote {}", path.display()));
                summary.built.push(id.clone());
                payloads.push(payload);
            }
            Err(skip) => {
                logging::warn(Stage::System, Some(id), &format!("{}, skipping", skip));
                summary.skipped.push((id.clone(), skip.to_string()));
            }
        }
    }

    let index_path = options.output_dir.join("index.json");
    write_json(&index_path, &build_index(&payloads))?;
    logging::info(
        Stage::Output,
        None,
        &format!("wrote {} events to {}", payloads.len(), options.output_dir.display()),
    );
    logging::log_build_summary(summary.discovered, summary.built.len(), summary.skipped.len());
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_from_dir_name() {
        assert_eq!(event_id_for_dir_name("201822_Mangkhut").as_deref(), Some("mangkhut"));
        assert_eq!(event_id_for_dir_name("Hato_2017").as_deref(), Some("hato"));
        assert_eq!(event_id_for_dir_name("2023 Saola-B").as_deref(), Some("saola-b"));
        assert_eq!(event_id_for_dir_name("2023_09"), None);
        assert_eq!(event_id_for_dir_name("2023_-_09"), None, "hyphens alone are not a name");
    }

    #[test]
    fn test_discover_skips_files_and_nameless_folders() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("2018_Mangkhut")).unwrap();
        std::fs::create_dir(root.path().join("2017_Hato")).unwrap();
        std::fs::create_dir(root.path().join("2020")).unwrap();
        std::fs::write(root.path().join("Notes.md"), "not a folder").unwrap();

        let events = discover_event_directories(root.path()).expect("readable root");
        let ids: Vec<_> = events.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["hato", "mangkhut"]);
        assert_eq!(events["mangkhut"], root.path().join("2018_Mangkhut"));
    }

    #[test]
    fn test_discover_missing_root_is_io_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(matches!(
            discover_event_directories(&missing),
            Err(IngestError::Io { .. })
        ));
    }

    #[test]
    fn test_build_options_resolve_relative_to_project_root() {
        let options = BuildOptions::new(
            Path::new("/srv/site"),
            Path::new("typhoon_data"),
            Path::new("/tmp/out"),
            ClassifierConfig::default(),
        );
        assert_eq!(options.typhoon_dir, PathBuf::from("/srv/site/typhoon_data"));
        assert_eq!(options.output_dir, PathBuf::from("/tmp/out"), "absolute paths stay put");
    }

    #[test]
    fn test_invalid_config_aborts_before_reading() {
        let root = tempfile::tempdir().unwrap();
        let config = ClassifierConfig {
            min_station_count: 0,
            ..ClassifierConfig::default()
        };
        let options =
            BuildOptions::new(root.path(), Path::new("missing"), Path::new("out"), config);
        assert!(matches!(build_all(&options), Err(BuildError::Config(_))));
    }
}
