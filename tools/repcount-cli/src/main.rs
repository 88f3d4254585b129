//! RepCount CLI: count exercise repetitions from recorded landmark streams.
//!
//! Usage:
//!   repcount count <PATH>      Replay a landmark stream through a counter
//!   repcount validate <PATH>   Check a landmark stream against the profiles
//!   repcount profiles          Show the exercise profiles
//!   repcount challenges        Show the preset challenges
//!   repcount config            Show or initialize the config file

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use repcount_common::config::{config_file_path, AppConfig};
use repcount_common::error::RepcountError;

mod commands;

#[derive(Parser)]
#[command(
    name = "repcount",
    about = "Exercise repetition counting from body-landmark streams",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a landmark stream (JSONL) through a counting session
    Count {
        /// Path to the landmark stream
        path: PathBuf,

        /// Exercise to count (squat, push-up, crunch)
        #[arg(short, long)]
        exercise: Option<String>,

        /// Preset challenge title; sets exercise and goal
        #[arg(short, long)]
        challenge: Option<String>,

        /// Target repetitions
        #[arg(short, long)]
        goal: Option<u32>,

        /// Pace frames at the stream's fps instead of as fast as possible
        #[arg(long)]
        realtime: bool,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a landmark stream against the exercise profiles
    Validate {
        /// Path to the landmark stream
        path: PathBuf,

        /// Only check this exercise
        #[arg(short, long)]
        exercise: Option<String>,
    },

    /// Show the exercise profiles
    Profiles,

    /// Show the preset challenges
    Challenges,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = config_file_path();
    let (config, config_error) = load_config(&config_path);

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    repcount_common::logging::init_logging(&logging);

    if let Some(e) = config_error {
        tracing::warn!(path = %config_path.display(), error = %e, "Ignoring config file, using defaults");
    }

    match cli.command {
        Commands::Count {
            path,
            exercise,
            challenge,
            goal,
            realtime,
            json,
        } => {
            commands::count::run(
                &config,
                commands::count::CountArgs {
                    path,
                    exercise,
                    challenge,
                    goal,
                    realtime,
                    json,
                },
            )
            .await
        }
        Commands::Validate { path, exercise } => commands::validate::run(path, exercise),
        Commands::Profiles => commands::profiles::run(),
        Commands::Challenges => commands::challenges::run(),
        Commands::Config { init } => commands::config::run(&config, init),
    }
}

/// Config at `path`, or defaults plus the reason the file was ignored.
///
/// Logging is not set up yet when this runs, so the failure is returned
/// rather than logged.
fn load_config(path: &Path) -> (AppConfig, Option<RepcountError>) {
    match AppConfig::read_from(path) {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(e) => (AppConfig::default(), Some(e)),
    }
}
