//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.satledger.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".satledger.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Submission rules.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Ticket and manager eligibility.
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report path. When unset, `satisfaction_report.<ext>` with the
    /// extension matching `format`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl GeneralConfig {
    /// Where the report is written.
    pub fn output_path(&self) -> PathBuf {
        match self.output {
            Some(ref output) => PathBuf::from(output),
            None => PathBuf::from(format!("{}.{}", DEFAULT_REPORT_STEM, self.format.extension())),
        }
    }

    /// Log level; `quiet` always wins.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

const DEFAULT_REPORT_STEM: &str = "satisfaction_report";

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

/// What to do when a customer rates the same ticket again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Count every rating independently
    #[default]
    Allow,
    /// Refuse a second rating for the same ticket
    Reject,
}

/// Submission rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Maximum feedback length in characters.
    #[serde(default = "default_max_feedback_len")]
    pub max_feedback_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            max_feedback_len: default_max_feedback_len(),
        }
    }
}

fn default_max_feedback_len() -> usize {
    500
}

/// How ticket and manager references are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    /// Every ticket and manager is eligible.
    #[default]
    Open,
    /// Only the listed tickets and managers are eligible.
    Static,
}

/// Registry settings, used when `mode = "static"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub mode: RegistryMode,

    /// Known tickets. Empty means any ticket that is not closed.
    #[serde(default)]
    pub tickets: Vec<u64>,

    /// Tickets that no longer accept ratings.
    #[serde(default)]
    pub closed_tickets: Vec<u64>,

    /// Known managers. Empty means any manager.
    #[serde(default)]
    pub managers: Vec<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.satledger.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Resolve the configuration to use: an explicit file when given,
    /// else `.satledger.toml` in `dir`, else defaults.
    ///
    /// A config file that exists but can't be read or parsed is an error.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_from_dir(dir)?.unwrap_or_default()),
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }

        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(policy) = args.duplicate_policy {
            self.ledger.duplicate_policy = policy;
        }

        if let Some(max) = args.max_feedback_len {
            self.ledger.max_feedback_len = max;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
