//! Backtrategy CLI: replay a market data series through the market clock.
//!
//! Commands:
//! - `replay`: bind a CSV series with a TOML clock config and print each tick
//!   as a JSON line
//! - `check`: bind without replaying and report the series shape

mod obs;

use anyhow::{bail, Context, Result};
use backtrategy_core::config::ClockConfig;
use backtrategy_core::data::{load_csv, MarketClock};
use clap::{Parser, Subcommand};
use obs::LogFormat;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "backtrategy",
    about = "Backtrategy CLI: replay market data through the backtest clock"
)]
struct Cli {
    /// Log level, overridden by BACKTRATEGY_LOG.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a series tick by tick, printing one JSON object per tick.
    Replay {
        /// Path to a headered CSV file.
        #[arg(long)]
        data: PathBuf,

        /// Path to a TOML clock config.
        #[arg(long)]
        config: PathBuf,

        /// Stop after this many ticks.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Bind a series and report its length and time span.
    Check {
        /// Path to a headered CSV file.
        #[arg(long)]
        data: PathBuf,

        /// Path to a TOML clock config.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Replay {
            data,
            config,
            limit,
        } => run_replay(&data, &config, limit),
        Commands::Check { data, config } => run_check(&data, &config),
    }
}

fn bind_from_files(data: &Path, config: &Path) -> Result<MarketClock> {
    let config = ClockConfig::from_file(config)?;
    let df = load_csv(data, &config.repr)
        .with_context(|| format!("loading {}", data.display()))?;
    let clock = config
        .bind(df)
        .with_context(|| format!("binding {}", data.display()))?;
    Ok(clock)
}

fn run_replay(data: &Path, config: &Path, limit: Option<usize>) -> Result<()> {
    let mut clock = bind_from_files(data, config)?;
    let limit = limit.unwrap_or(usize::MAX);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut emitted = 0usize;
    while emitted < limit {
        let Some(tick) = clock.current_tick()? else {
            break;
        };
        serde_json::to_writer(&mut out, &tick)?;
        out.write_all(b"\n")?;
        emitted += 1;
        clock.advance();
    }
    out.flush()?;

    tracing::info!(
        emitted,
        rows = clock.len(),
        exhausted = clock.is_exhausted(),
        "replay finished"
    );
    Ok(())
}

fn run_check(data: &Path, config: &Path) -> Result<()> {
    let mut clock = bind_from_files(data, config)?;
    if clock.is_empty() {
        bail!("{} contains no rows", data.display());
    }

    let first = clock.current_time()?;
    let mut last = first;
    let mut out_of_order = 0usize;
    while clock.advance().is_some() {
        let now = clock.current_time()?;
        if now < last {
            out_of_order += 1;
        }
        last = now;
    }

    println!("Rows:         {}", clock.len());
    println!("Class:        {}", clock.class());
    println!("First tick:   {}", first.to_rfc3339());
    println!("Last tick:    {}", last.to_rfc3339());
    println!("Out of order: {out_of_order}");
    Ok(())
}
