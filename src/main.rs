//! satledger - customer satisfaction ledger
//!
//! Replays a batch of rating submissions against an in-memory ledger
//! and writes a satisfaction report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, unreadable batch, report write failure)
//!   2 - Submissions were rejected and --fail-on-rejected is set

use anyhow::{Context, Result};
use chrono::Utc;
use satisfaction_ledger::batch::{self, ReplayOptions};
use satisfaction_ledger::cli::{Args, OutputFormat};
use satisfaction_ledger::config::{Config, CONFIG_FILE};
use satisfaction_ledger::ledger::{registry, LedgerOptions, SatisfactionLedger};
use satisfaction_ledger::models::{Report, ReportMetadata};
use satisfaction_ledger::report;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config, args.quiet);

    info!("satledger v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Replay failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .satledger.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the duplicate policy, feedback limit and registry.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` wins over the verbosity settings.
fn init_logging(config: &Config, quiet: bool) {
    let level = config.general.log_level(quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Replay the batch and write the report. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let input = args
        .input
        .clone()
        .context("An --input file is required")?;

    let requests = batch::load_requests(&input)?;
    if !args.quiet {
        println!("📥 Loaded {} submissions from {}", requests.len(), input.display());
    }

    let ledger = Arc::new(SatisfactionLedger::new(
        registry::from_config(&config.registry),
        LedgerOptions::from(&config.ledger),
    ));
    info!(
        "Ledger ready (duplicates: {:?}, feedback limit: {}, registry: {:?})",
        config.ledger.duplicate_policy, config.ledger.max_feedback_len, config.registry.mode
    );

    let options = ReplayOptions {
        concurrency: args.concurrency,
        show_progress: !args.quiet,
    };
    let outcome = batch::replay(Arc::clone(&ledger), requests, options).await?;

    let metadata = ReportMetadata {
        input: input.display().to_string(),
        generated_at: Utc::now(),
        submissions: outcome.submitted,
        accepted: outcome.accepted,
        rejected: outcome.rejections.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let snapshot = ledger.snapshot();
    let has_rejections = outcome.has_rejections();
    let report = Report::from_snapshot(metadata, &snapshot, outcome.rejections);

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = config.general.output_path();
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        print_summary(&report);
    }

    // An explicit --manager query is answered even in quiet mode.
    if let Some(ref manager) = args.manager {
        let trend = ledger.manager_satisfaction_trend(manager);
        println!("\n{}", report::format_trend(manager, &trend));
    }

    if !args.quiet {
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    if args.fail_on_rejected && has_rejections {
        warn!("{} submissions rejected", report.rejections.len());
        eprintln!(
            "\n⛔ {} submissions were rejected. Failing (exit code 2).",
            report.rejections.len()
        );
        return Ok(2);
    }

    Ok(0)
}

fn print_summary(report: &Report) {
    println!("\n📊 Satisfaction Summary:");
    println!(
        "   Submissions: {} | Accepted: {} | Rejected: {}",
        report.metadata.submissions, report.metadata.accepted, report.metadata.rejected
    );
    println!(
        "   Global average: {} over {} ratings ({}% five-star)",
        report.global.average_rating,
        report.global.total_ratings,
        report.global_five_star_percentage
    );
    println!("   Managers rated: {}", report.managers.len());
    println!("   Tickets rated: {}", report.tickets.len());
}

/// Load configuration from file or defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::resolve(args.config.as_deref(), Path::new("."))?;
    config.merge_with_args(args);
    Ok(config)
}
