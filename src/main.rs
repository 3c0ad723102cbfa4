mod analysis;
mod bands;
mod config;
mod data;
mod manager;
mod model;
mod stats;

use crate::manager::Manager;
use crate::model::Window;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// JSON or MessagePack file with the readings to analyze.
    #[arg(long)]
    readings: PathBuf,

    /// TOML configuration file (bands, units, adequacy policy).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the report to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct WindowArgs {
    /// Inclusive window start (RFC 3339).
    #[arg(long)]
    start: DateTime<Utc>,

    /// Exclusive window end (RFC 3339).
    #[arg(long)]
    end: DateTime<Utc>,
}

impl WindowArgs {
    fn window(&self) -> Window {
        Window::new(self.start, self.end)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    Filter {
        #[arg(long, requires = "end")]
        start: Option<DateTime<Utc>>,

        #[arg(long, requires = "start")]
        end: Option<DateTime<Utc>>,

        /// Also exclude readings of incomplete days.
        #[arg(long)]
        strict: bool,
    },

    Coverage {
        #[command(flatten)]
        window: WindowArgs,
    },

    Threshold {
        #[command(flatten)]
        window: WindowArgs,
    },

    Average {
        #[command(flatten)]
        window: WindowArgs,

        /// Report a bare number, null when there is not enough data.
        #[arg(long)]
        plain: bool,
    },

    Breakdown {
        #[command(flatten)]
        window: WindowArgs,

        /// Report counts instead of percentages.
        #[arg(long)]
        counts: bool,

        /// Report bare numbers, all null when there is not enough data.
        #[arg(long)]
        plain: bool,
    },

    Summary {
        #[command(flatten)]
        window: WindowArgs,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr =
        Manager::new(args.readings, args.config, args.output).context("failed to construct mgr")?;

    match args.command {
        Command::Filter { start, end, strict } => {
            let window = start.zip(end).map(|(start, end)| Window::new(start, end));
            mgr.filter(window, strict)?
        }
        Command::Coverage { window } => mgr.coverage(window.window())?,
        Command::Threshold { window } => mgr.threshold(window.window())?,
        Command::Average { window, plain } => mgr.average(window.window(), plain)?,
        Command::Breakdown {
            window,
            counts,
            plain,
        } => mgr.breakdown(window.window(), counts, plain)?,
        Command::Summary { window } => mgr.summary(window.window())?,
    }

    Ok(())
}
