//! `signal8` command-line entry point.
//!
//! Usage:
//!   signal8 build --typhoon-dir typhoon_data --output-dir data
//!   signal8 build --config signal8.toml --log-level debug --log-file build.log

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use signal8_service::config::ClassifierConfig;
use signal8_service::events::{BuildOptions, build_all};
use signal8_service::logging::{self, LogLevel, Stage};

#[derive(Parser, Debug)]
#[command(name = "signal8")]
#[command(about = "Corroborate Hong Kong Signal 8 issuances against observed winds")]
#[command(version)]
struct CliArgs {
    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Classify every event and write index.json plus events/<id>.json
    Build {
        /// Folder of per-event CSV folders, relative to the project root
        #[arg(long, default_value = "typhoon_data")]
        typhoon_dir: PathBuf,

        /// Where to write the generated JSON, relative to the project root
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,

        /// Folder holding the portal markdown file
        #[arg(long, default_value = ".")]
        project_root: PathBuf,

        /// TOML file with classifier thresholds (falls back to SIGNAL8_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,

        /// debug, info, warn or error
        #[arg(long, default_value = "info")]
        log_level: LogLevel,

        /// Also append log lines to this file
        #[arg(long)]
        log_file: Option<String>,

        /// Prefix console lines with UTC timestamps
        #[arg(long)]
        timestamps: bool,
    },
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match args.command {
        SubCommand::Build {
            typhoon_dir,
            output_dir,
            project_root,
            config,
            log_level,
            log_file,
            timestamps,
        } => {
            logging::init_logger(log_level, log_file.as_deref(), timestamps);

            let config = match ClassifierConfig::load(config.as_deref()) {
                Ok(c) => c,
                Err(e) => {
                    logging::error(Stage::System, None, &e.to_string());
                    return ExitCode::FAILURE;
                }
            };
            logging::info(
                Stage::System,
                None,
                &format!(
                    "threshold {} km/h, {} stations, {} x {} min",
                    config.wind_threshold_kmh,
                    config.min_station_count,
                    config.min_persistence_intervals,
                    config.interval_minutes
                ),
            );

            let options = BuildOptions::new(&project_root, &typhoon_dir, &output_dir, config);
            match build_all(&options) {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    logging::error(Stage::System, None, &e.to_string());
                    ExitCode::FAILURE
                }
            }
        }
    }
}
