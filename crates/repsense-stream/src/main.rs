//! repsense-replay: run a recorded pose session through a rep counter.
//!
//! Prints one JSON report per frame on stdout followed by the session
//! summary. Logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use repsense_motion::Exercise;
use repsense_stream::{spawn, JsonLinesSource, SessionRunner, Settings};

#[derive(Parser, Debug)]
#[command(name = "repsense-replay", version, about = "Replay recorded pose frames through a rep counter")]
struct Cli {
    /// Exercise to count (curl, squat, pushup)
    #[arg(short, long)]
    exercise: Exercise,

    /// Recorded frames, one JSON object per line; `-` reads stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// TOML settings file; REPSENSE_* environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only print the final summary
    #[arg(long)]
    summary_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::from_env().context("loading settings from environment")?,
    };
    let config = settings.exercise_config(cli.exercise)?;
    let runner = SessionRunner::new(&config)?;
    let queue = settings.stream.report_queue_size;

    let (handle, mut reports) = if cli.input.as_os_str() == "-" {
        let source = JsonLinesSource::new(BufReader::new(tokio::io::stdin()));
        spawn(runner, source, queue)
    } else {
        let source = JsonLinesSource::open(&cli.input).await?;
        spawn(runner, source, queue)
    };

    while let Some(report) = reports.recv().await {
        if !cli.summary_only {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    let summary = handle.join().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
