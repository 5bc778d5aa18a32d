/// Structured logging for the Signal 8 build pipeline
///
/// Provides context-rich logging tagged with the pipeline stage and the
/// event being processed. Supports console output and an optional log file.
/// The classification core never logs; only ingest, the event pipeline and
/// the binary do.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Metadata,
    Csv,
    Classifier,
    Output,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Metadata => write!(f, "META"),
            Stage::Csv => write!(f, "CSV"),
            Stage::Classifier => write!(f, "TIER"),
            Stage::Output => write!(f, "OUT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(
        level: LogLevel,
        stage: &Stage,
        event_id: Option<&str>,
        message: &str,
    ) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let event_part = event_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, event_part, message)
    }

    fn log(&self, level: LogLevel, stage: &Stage, event_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, stage, event_id, message);
        let event_part = event_id.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, event_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, event_part, message),
                LogLevel::Info => println!("   {}{}: {}", stage, event_part, message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", stage, event_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, stage: Stage, event_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &stage, event_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, event_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, stage, event_id, message);
}

/// Log a warning message
pub fn warn(stage: Stage, event_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, stage, event_id, message);
}

/// Log an error message
pub fn error(stage: Stage, event_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, stage, event_id, message);
}

/// Log a debug message
pub fn debug(stage: Stage, event_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, stage, event_id, message);
}

// ---------------------------------------------------------------------------
// Build Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a build run. Level escalates with the skip ratio.
pub fn log_build_summary(total: usize, built: usize, skipped: usize) {
    let message = format!(
        "Build complete: {}/{} events classified, {} skipped",
        built, total, skipped
    );

    if skipped == 0 {
        info(Stage::System, None, &message);
    } else if built == 0 {
        error(Stage::System, None, &message);
    } else {
        warn(Stage::System, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parses_case_insensitively() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_entry_carries_stage_and_event() {
        let entry = Logger::format_entry(LogLevel::Warning, &Stage::Csv, Some("hato"), "no rows");
        assert!(entry.contains("WARN CSV [hato]: no rows"), "got '{}'", entry);
    }

    #[test]
    fn test_entry_without_event_has_no_brackets() {
        let entry = Logger::format_entry(LogLevel::Info, &Stage::System, None, "done");
        assert!(entry.ends_with("INFO SYS: done"), "got '{}'", entry);
    }
}
