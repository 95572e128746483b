//! Ride dispatch binary.
//!
//! Replays a file of dispatch commands, one per line, and writes each reply
//! to the output file. Exits with status 1 if the run halted on a duplicate
//! ride number.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ride_dispatch::command;
use ride_dispatch::{DEFAULT_GROWTH_LIMIT, DEFAULT_SURCHARGE, DispatchConfig, Dispatcher};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "ride_dispatch", version)]
#[command(about = "Replays ride dispatch commands from a file")]
struct Args {
    /// File of commands, one per line
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where replies are written
    #[arg(short, long, value_name = "PATH", default_value = "output_file.txt")]
    output: PathBuf,

    /// Cost added when an update lengthens a trip
    #[arg(long, value_name = "COST", default_value_t = DEFAULT_SURCHARGE)]
    surcharge: u64,

    /// Drop a ride whose new duration exceeds this multiple of the current one
    #[arg(long, value_name = "FACTOR", default_value_t = DEFAULT_GROWTH_LIMIT)]
    growth_limit: u64,

    /// Rides to reserve room for up front
    #[arg(long, value_name = "RIDES", default_value_t = 0)]
    capacity: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr so they never mix with replies.
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let input = File::open(&args.input).with_context(|| format!("failed to open {}", args.input.display()))?;
    let output = File::create(&args.output).with_context(|| format!("failed to create {}", args.output.display()))?;

    let config = DispatchConfig::new()
        .with_capacity(args.capacity)
        .with_surcharge(args.surcharge)
        .with_growth_limit(args.growth_limit);
    let mut rides = Dispatcher::with_config(config);

    info!(input = %args.input.display(), output = %args.output.display(), "replaying commands");

    let summary = command::run(&mut rides, BufReader::new(input), BufWriter::new(output))
        .with_context(|| format!("failed to replay {}", args.input.display()))?;

    info!(
        executed = summary.executed,
        skipped = summary.skipped,
        pending = rides.len(),
        halted = summary.halted,
        "done"
    );

    Ok(if summary.halted { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
