use std::{fs, path::PathBuf, process::ExitCode};

use ast::{InvalidWorkingHoursError, WorkingHours};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{ArgAction, Parser as _};
use log::LevelFilter;
use parser::{ParseError, Parser};
use processing::detect_conflicts;
use settings::WorkingHoursSettings;

mod ast;
mod parser;
mod processing;
mod report;
mod settings;

/// Report which meetings of a day clash with one another.
#[derive(Debug, Clone, clap::Parser)]
#[clap(version, about)]
struct Cli {
    /// Input file with one `start end` pair of times per line
    #[clap(short, long)]
    infile: PathBuf,
    /// Day of the schedule (YYYY-MM-DD), defaults to today
    #[clap(short, long)]
    day: Option<NaiveDate>,
    /// Start of working hours (HH:MM)
    #[clap(long, requires = "close")]
    open: Option<NaiveTime>,
    /// End of working hours (HH:MM)
    #[clap(long, requires = "open")]
    close: Option<NaiveTime>,
    /// Print the report as JSON
    #[clap(long)]
    json: bool,
    /// Log more, repeat for more detail
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },
    #[error(transparent)]
    WorkingHours(#[from] InvalidWorkingHoursError),
    #[error(transparent)]
    Schedule(#[from] processing::Error),
    #[error("cannot render report: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("🛑 {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, AppError> {
    let path = &cli.infile;
    let source = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.clone(),
        source,
    })?;

    let mut parser = Parser::new(source.chars().collect());
    let schedule = parser.parse_file().map_err(|source| AppError::Parse {
        path: path.clone(),
        source,
    })?;
    log::info!("loaded {} meetings from {}", schedule.meetings.len(), path.display());

    let settings = schedule.settings.as_ref();
    let day = cli
        .day
        .or_else(|| settings.and_then(|settings| settings.day))
        .unwrap_or_else(|| Local::now().date_naive());

    let working_hours = match (cli.open, cli.close) {
        (Some(open), Some(close)) => Some(WorkingHours::new(open, close)?),
        _ => settings
            .and_then(|settings| settings.working_hours.as_ref())
            .map(WorkingHoursSettings::resolve)
            .transpose()?,
    };
    log::debug!("day {day}, working hours {working_hours:?}");

    let report = detect_conflicts(&schedule.meetings, working_hours.as_ref())?;

    if cli.json {
        Ok(report::render_json(&report, day)? + "\n")
    } else {
        Ok(report::render_text(&report, day))
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}
