use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::{ShareCount, Threshold};
use crate::stream::{DEFAULT_CHUNK_SIZE, StreamOptions};

fn parse_number(s: &str) -> Result<u8, String> {
    s.parse()
        .map_err(|_| format!("'{s}' is not a number between 1 and 255"))
}

/// Accepts 1..=255 shares
fn validate_share_count(s: &str) -> Result<ShareCount, String> {
    ShareCount::new(parse_number(s)?).map_err(|e| e.to_string())
}

/// A threshold of 1 is accepted but turns every horcrux into a plain copy;
/// the split logs a warning about it
fn validate_threshold(s: &str) -> Result<Threshold, String> {
    Threshold::new(parse_number(s)?).map_err(|e| e.to_string())
}

fn validate_chunk_size(s: &str) -> Result<usize, String> {
    let size: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid chunk size"))?;
    StreamOptions::new(size).map(|options| options.chunk_size()).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "horcrux")]
#[command(version, about = "Split a file into horcruxes; any threshold of them bring it back")]
pub struct Cli {
    /// Log level
    #[arg(long, global = true, env = "HORCRUX_LOG_LEVEL", value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, env = "HORCRUX_LOG_FORMAT", value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Bytes processed per read while streaming
    #[arg(
        long,
        global = true,
        env = "HORCRUX_CHUNK_SIZE",
        value_parser = validate_chunk_size,
        default_value_t = DEFAULT_CHUNK_SIZE
    )]
    pub chunk_size: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a file into horcruxes
    Split {
        /// File to split
        source: PathBuf,

        /// Number of horcruxes to create
        #[arg(short = 'n', long, value_parser = validate_share_count)]
        shares: ShareCount,

        /// Minimum number of horcruxes needed to bring the file back
        #[arg(short, long, value_parser = validate_threshold)]
        threshold: Threshold,

        /// Directory for the horcruxes [default: <source stem>_horcruxes next to the source]
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },
    /// Bring a file back from its horcruxes
    Bind {
        /// Horcrux files; repeated paths count once
        #[arg(required = true)]
        shares: Vec<PathBuf>,

        /// Where to write the file [default: original name next to the first horcrux]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace the output file if it already exists
        #[arg(short, long)]
        force: bool,
    },
    /// Show what a group of horcruxes agrees on and whether it can be bound
    Inspect {
        /// Horcrux files
        #[arg(required = true)]
        shares: Vec<PathBuf>,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}
