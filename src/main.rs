mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use yearplan_core::{AppError, Config, MonthPointer};
use yearplan_session::CalendarController;
use yearplan_store::{FileStore, MemoryLocation};

#[derive(Parser)]
#[command(name = "yearplan")]
#[command(about = "Plan a year of colored, textured and annotated days")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Page address to open, e.g. a share link with `calendar` and `data`
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the active calendar
    Show,
    /// List every known calendar
    Calendars,
    /// Toggle the selected tool on a day (YYYY-MM-DD)
    Paint {
        date: NaiveDate,

        /// Select this color or texture first
        #[arg(short, long)]
        tool: Option<String>,
    },
    /// Set or clear (empty text) a day's note
    Note { date: NaiveDate, text: String },
    /// Set the visible months (YYYY-MM, January is 01)
    Range {
        #[arg(value_parser = parse_month)]
        start: MonthPointer,

        #[arg(value_parser = parse_month)]
        end: Option<MonthPointer>,
    },
    /// Select the calendar view (Linear, Classic, Column)
    View { name: String },
    /// Select the painting tool by code
    Tool { code: String },
    /// Make another calendar active
    Switch { id: String },
    /// Print a share link for the active calendar
    Share,
    /// Write the active calendar to a JSON file
    Export {
        /// Output path (defaults to a dated file name in the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Merge a previously exported JSON file into the active calendar
    Import { file: PathBuf },
    /// Reset the active calendar to defaults
    Clean,
}

/// Human month token: `2025-03` is March.
fn parse_month(s: &str) -> Result<MonthPointer, String> {
    let token: MonthPointer = s.parse().map_err(|e| format!("{}", e))?;
    let month = token
        .month
        .checked_sub(1)
        .ok_or_else(|| format!("Month {} is outside 1..=12", token.month))?;
    MonthPointer::new(token.year, month)
        .map_err(|_| format!("Month {} is outside 1..=12", token.month))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("Command failed: {:#}", err);
            match AppError::classify(err) {
                AppError::Other(err) => eprintln!("error: {:#}", err),
                app => eprintln!("error: {} ({})", app.user_message(), app),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let (config, _) = Config::load_validated(&config_path)?;
    yearplan_core::init(&config.logging.filter);

    tracing::debug!("Using data directory {:?}", config.data_dir);

    let href = cli.url.unwrap_or_else(|| config.share.base_url.clone());
    let mut controller = CalendarController::load(
        FileStore::new(&config.data_dir),
        MemoryLocation::new(href),
    );

    commands::run(&mut controller, cli.command)?;

    if let Some(notice) = controller.storage_notice() {
        eprintln!("warning: {} ({})", notice.message, notice.detail);
    }

    Ok(())
}
