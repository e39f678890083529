use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, Context};
use clap::Parser;
use log::{info, warn};

use imaris_stats::engine::collect_dumps;
use imaris_stats::{DumpStorage, QueryConfig, ResultsTable, StatisticsDump, StatsQuery};

/// Reshape engine statistics dumps into one row per object
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Statistics dump (.json), or a directory searched for dumps
    input: PathBuf,

    /// TOML file with the selection to apply
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Object id to keep (repeatable)
    #[arg(long = "id")]
    ids: Vec<i64>,

    /// Regular expression matched against statistic names (repeatable)
    #[arg(long = "stat")]
    statistics: Vec<String>,

    /// Channel to keep, engine numbering; values <= 0 are ignored (repeatable)
    #[arg(long = "channel")]
    channels: Vec<i64>,

    /// Timepoint to keep, engine numbering (repeatable)
    #[arg(long = "time")]
    timepoints: Vec<i64>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write JSON instead of CSV
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = match &args.config {
        Some(path) => QueryConfig::load(path)?,
        None => QueryConfig::default(),
    };

    let dumps = if args.input.is_dir() {
        collect_dumps(&args.input)?
    } else {
        vec![(args.input.clone(), DumpStorage::new(&args.input).load()?)]
    };

    if dumps.is_empty() {
        warn!("No statistics dumps found in {}", args.input.display());
    }

    let mut table = ResultsTable::new();
    for (path, dump) in &dumps {
        run_query(&args, &config, dump, &mut table)
            .with_context(|| format!("Failed to query {}", path.display()))?;
    }

    info!("Collected {} rows from {} dumps", table.len(), dumps.len());

    match (&args.output, args.json) {
        (Some(path), true) => table.save_json(path)?,
        (Some(path), false) => table.save_csv(path)?,
        (None, true) => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", table.to_json_string()?)?;
        }
        (None, false) => table.write_csv(std::io::stdout().lock())?,
    }

    Ok(())
}

/// Query one dump and append its rows to `table`
fn run_query(args: &Args, config: &QueryConfig, dump: &StatisticsDump, table: &mut ResultsTable) -> Result<()> {
    let mut query = config.apply(StatsQuery::new(dump)?)
        .select_ids(args.ids.iter().copied())
        .select_statistics(args.statistics.iter().cloned())
        .select_times(args.timepoints.iter().copied());

    for &channel in &args.channels {
        query = query.select_channel(channel);
    }

    query.execute_into(dump, table)?;
    Ok(())
}
