use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use horcrux::cli::{Cli, Commands, LogFormat, LogLevel};
use horcrux::combiner::default_destination;
use horcrux::domain::{ShareCount, SplitConfig, Threshold};
use horcrux::group::{GroupState, dedup_paths};
use horcrux::splitter::default_output_dir;
use horcrux::stream::StreamOptions;
use horcrux::{bind_with, get_horcruxes, split_with};

/// Logs go to stderr so that stdout only carries command output
fn setup_logging(log_level: LogLevel, log_format: LogFormat) -> Result<()> {
    let level = tracing::Level::from(log_level);
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    match log_format {
        LogFormat::Json => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        LogFormat::Plain => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
    }

    Ok(())
}

fn run_split(
    source: &Path,
    shares: ShareCount,
    threshold: Threshold,
    destination: Option<PathBuf>,
    options: StreamOptions,
) -> Result<()> {
    let config = SplitConfig::new(threshold, shares)?;
    let destination = destination.unwrap_or_else(|| default_output_dir(source));

    let paths = split_with(source, &destination, config, options)
        .with_context(|| format!("Failed to split {}", source.display()))?;

    println!(
        "Split {} into {} horcruxes; any {} of them bring it back:",
        source.display(),
        *shares,
        *threshold
    );
    for path in paths {
        println!("  {}", path.display());
    }
    Ok(())
}

fn run_bind(
    shares: &[PathBuf],
    output: Option<PathBuf>,
    force: bool,
    options: StreamOptions,
) -> Result<()> {
    let shares = dedup_paths(shares);
    let destination = match output {
        Some(path) => path,
        None => {
            let horcruxes = get_horcruxes(&shares)?;
            default_destination(&horcruxes).context("No horcruxes provided")?
        }
    };

    if let Err(e) = bind_with(&shares, &destination, force, options) {
        if e.is_already_exists() {
            return Err(anyhow::Error::new(e).context("Pass --force to overwrite it"));
        }
        return Err(e).context("Failed to bind horcruxes");
    }

    info!(destination = %destination.display(), "bind finished");
    println!("Resurrected {}", destination.display());
    Ok(())
}

fn run_inspect(shares: &[PathBuf], json: bool) -> Result<()> {
    let state = GroupState::assess(shares)?;

    if json {
        let kind = match &state {
            GroupState::Empty => "empty",
            GroupState::InsufficientShares { .. } => "insufficient_shares",
            GroupState::Inconsistent { .. } => "inconsistent",
            GroupState::ReadyToCombine { .. } => "ready_to_combine",
        };
        let report = serde_json::json!({
            "state": kind,
            "can_combine": state.can_combine(),
            "summary": state.summary(),
            "destination": state.destination(),
            "message": state.describe(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", state.describe());
    if let Some(summary) = state.summary() {
        println!("  original:  {} ({} bytes)", summary.original_filename, summary.file_size);
        println!("  threshold: {} of {}", summary.threshold, summary.total);
        println!("  present:   {:?}", summary.indices);
        println!("  split id:  {}", summary.split_id);
        println!("  sha-256:   {}", summary.checksum);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level, cli.log_format)?;
    let options = StreamOptions::new(cli.chunk_size)?;

    match cli.command {
        Commands::Split {
            source,
            shares,
            threshold,
            destination,
        } => run_split(&source, shares, threshold, destination, options)?,
        Commands::Bind {
            shares,
            output,
            force,
        } => run_bind(&shares, output, force, options)?,
        Commands::Inspect { shares, json } => run_inspect(&shares, json)?,
    }

    Ok(())
}
