//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::DuplicatePolicy;
use clap::Parser;

pub use crate::config::OutputFormat;
use std::path::PathBuf;

/// satledger - customer satisfaction ledger
///
/// Replays a batch of customer ratings, aggregates them per ticket, per
/// manager and globally, and writes a satisfaction report.
///
/// Examples:
///   satledger --input ratings.json
///   satledger --input ratings.jsonl --format json --output report.json
///   satledger --input ratings.json --manager ST2JHG361ZXG51QTKY2NQCVBPPRRE2KZB1HR05NNC
///   satledger --input ratings.json --duplicate-policy reject --fail-on-rejected
///   satledger --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Batch of rating submissions (JSON array or JSON Lines)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the config value, else satisfaction_report.md/.json.
    #[arg(short, long, value_name = "FILE", env = "SATLEDGER_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    ///
    /// Defaults to the config value, else markdown.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .satledger.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "SATLEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the satisfaction trend of one manager after the replay
    #[arg(short, long, value_name = "PRINCIPAL")]
    pub manager: Option<String>,

    /// Policy for repeated ratings of a ticket by the same customer
    #[arg(long, value_name = "POLICY")]
    pub duplicate_policy: Option<DuplicatePolicy>,

    /// Maximum feedback length in characters
    #[arg(long, value_name = "CHARS")]
    pub max_feedback_len: Option<usize>,

    /// Number of workers replaying the batch
    ///
    /// With more than one worker, rating ids no longer follow batch order.
    #[arg(long, default_value = "1", value_name = "NUM")]
    pub concurrency: usize,

    /// Exit with code 2 if any submission was rejected
    #[arg(long)]
    pub fail_on_rejected: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .satledger.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.concurrency == 0 {
            return Err("Concurrency must be at least 1".to_string());
        }

        if let Some(max) = self.max_feedback_len {
            if max == 0 {
                return Err("Max feedback length must be at least 1".to_string());
            }
        }

        if let Some(ref manager) = self.manager {
            if manager.trim().is_empty() {
                return Err("Manager principal cannot be empty".to_string());
            }
        }

        match self.input {
            Some(ref path) if !path.is_file() => {
                Err(format!("Input file does not exist: {}", path.display()))
            }
            Some(_) => Ok(()),
            None => Err("An --input file is required".to_string()),
        }
    }
}
