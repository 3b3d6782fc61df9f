//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{edit_cmd, status_cmd};
use crate::pipeline::{FixedClock, StatusPipeline};
use crate::storage::{Config, Settings};

#[derive(Parser)]
#[command(name = "statusflow")]
#[command(
    author,
    version,
    about = "Cycle task checkboxes and stamp lifecycle dates in markdown files"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Settings file to use instead of the project or global config
    #[arg(long, global = true, env = "STATUSFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pin the date used for stamps (YYYY-MM-DD)
    #[arg(long, global = true, hide = true)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write default settings to .statusflow/config.toml
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show the status a marker advances to
    Next {
        /// Current marker (a single character, or "space")
        mark: String,
    },

    /// List configured statuses, markers and cycles
    Statuses,

    /// Show the status menu for a marker
    Menu {
        /// Current marker (a single character, or "space")
        mark: String,
    },

    /// Click the checkbox on a line
    Cycle {
        /// Markdown file
        file: PathBuf,

        /// 1-based line number
        line: usize,
    },

    /// Set the task on a line to a named status
    Set {
        /// Markdown file
        file: PathBuf,

        /// 1-based line number
        line: usize,

        /// Status name
        status: String,
    },

    /// Apply a recorded transaction through the pipeline
    ///
    /// The transaction file is JSON:
    ///   {"changes": [{"from": 3, "to": 4, "insert": "x"}], "user_event": "input.type"}
    Replay {
        /// Markdown file
        file: PathBuf,

        /// Transaction JSON file
        transaction: PathBuf,

        /// Print the result without writing the file
        #[arg(long)]
        dry_run: bool,
    },
}

/// Settings and clock shared by every command
pub struct Session {
    pub settings: Settings,
    pub today: Option<NaiveDate>,
}

impl Session {
    /// Builds the pipeline for this session
    pub fn pipeline(&self) -> Result<StatusPipeline> {
        let model = self.settings.statuses.clone();
        let dates = self.settings.dates.clone();

        let pipeline = match self.today {
            Some(date) => StatusPipeline::with_clock(model, dates, FixedClock::on(date)),
            None => StatusPipeline::new(model, dates),
        };
        pipeline.context("Failed to build status pipeline")
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "statusflow=debug"
    } else {
        "statusflow=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Config::from_path(path),
        None => Ok(Config::load()?.settings),
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Init { path } = &cli.command {
        let written = Config::init_project(path)?;
        let output = Output::new(cli.format.unwrap_or_default());
        output.success(&format!("Wrote default settings to {}", written.display()));
        return Ok(());
    }

    let settings = load_settings(cli.config.as_ref())?;
    tracing::debug!(statuses = settings.statuses.statuses.len(), "Settings loaded");

    let output = Output::new(cli.format.unwrap_or_else(|| settings.default_format.into()));
    let session = Session {
        settings,
        today: cli.today,
    };

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Next { mark } => status_cmd::next(&output, &session, &mark),
        Commands::Statuses => status_cmd::list(&output, &session),
        Commands::Menu { mark } => status_cmd::menu(&output, &session, &mark),
        Commands::Cycle { file, line } => edit_cmd::cycle(&output, &session, &file, line),
        Commands::Set { file, line, status } => {
            edit_cmd::set(&output, &session, &file, line, &status)
        }
        Commands::Replay {
            file,
            transaction,
            dry_run,
        } => edit_cmd::replay(&output, &session, &file, &transaction, dry_run),
    }
}
