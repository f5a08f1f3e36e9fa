//! Batch loading and replay of rating submissions.
//!
//! A batch is either a JSON array of submission objects or a JSON Lines
//! file with one submission per line. Replaying feeds every submission
//! through a shared ledger and collects the rejected ones.

use crate::ledger::SatisfactionLedger;
use crate::models::{RatingRequest, Rejection};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Batch file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    /// A single JSON array.
    Array,
    /// One JSON object per line.
    Lines,
}

impl BatchFormat {
    /// Pick the layout from the file extension (`.jsonl`/`.ndjson` are lines).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                BatchFormat::Lines
            }
            _ => BatchFormat::Array,
        }
    }
}

/// Load all submissions from a batch file.
pub fn load_requests(path: &Path) -> Result<Vec<RatingRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;

    let requests: Vec<RatingRequest> = match BatchFormat::from_path(path) {
        BatchFormat::Array => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse batch file: {}", path.display()))?,
        BatchFormat::Lines => parse_lines(&content)
            .with_context(|| format!("Failed to parse batch file: {}", path.display()))?,
    };

    debug!("Loaded {} submissions from {}", requests.len(), path.display());
    Ok(requests)
}

/// Parse JSON Lines, skipping blank lines and `#` comments.
pub fn parse_lines(content: &str) -> Result<Vec<RatingRequest>> {
    let mut requests = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let request: RatingRequest = serde_json::from_str(line)
            .with_context(|| format!("Invalid submission on line {}", index + 1))?;
        requests.push(request);
    }

    Ok(requests)
}

/// Replay settings.
#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    /// Number of workers submitting in parallel. With 1 worker, rating ids
    /// follow the order of the batch.
    pub concurrency: usize,
    /// Show a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            show_progress: false,
        }
    }
}

/// Result of replaying a batch.
#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    pub submitted: usize,
    pub accepted: usize,
    /// Rejected submissions, ordered by batch position.
    pub rejections: Vec<Rejection>,
}

impl ReplayOutcome {
    pub fn has_rejections(&self) -> bool {
        !self.rejections.is_empty()
    }

    fn merge(&mut self, other: ReplayOutcome) {
        self.submitted += other.submitted;
        self.accepted += other.accepted;
        self.rejections.extend(other.rejections);
    }
}

/// Submit every request to the ledger.
pub async fn replay(
    ledger: Arc<SatisfactionLedger>,
    requests: Vec<RatingRequest>,
    options: ReplayOptions,
) -> Result<ReplayOutcome> {
    let total = requests.len();
    let progress = create_progress_bar(total as u64, options.show_progress);

    let positioned: Vec<(usize, RatingRequest)> = requests
        .into_iter()
        .enumerate()
        .map(|(i, r)| (i + 1, r))
        .collect();

    let workers = options.concurrency.max(1).min(total.max(1));
    let shard_size = total.div_ceil(workers).max(1);

    let mut shards = Vec::with_capacity(workers);
    let mut iter = positioned.into_iter().peekable();
    while iter.peek().is_some() {
        let shard: Vec<_> = iter.by_ref().take(shard_size).collect();
        let ledger = Arc::clone(&ledger);
        let progress = progress.clone();
        shards.push(tokio::task::spawn_blocking(move || {
            replay_shard(&ledger, shard, &progress)
        }));
    }

    let results = futures::future::try_join_all(shards)
        .await
        .context("Replay worker panicked")?;

    let mut outcome = ReplayOutcome::default();
    for shard in results {
        outcome.merge(shard);
    }
    outcome.rejections.sort_by_key(|r| r.position);

    progress.finish_with_message("Replay complete");

    info!(
        "Replayed {} submissions: {} accepted, {} rejected",
        outcome.submitted,
        outcome.accepted,
        outcome.rejections.len()
    );

    Ok(outcome)
}

fn replay_shard(
    ledger: &SatisfactionLedger,
    shard: Vec<(usize, RatingRequest)>,
    progress: &ProgressBar,
) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();

    for (position, request) in shard {
        outcome.submitted += 1;
        match ledger.submit(&request) {
            Ok(_) => outcome.accepted += 1,
            Err(e) => {
                warn!("Submission {} rejected ({}): {}", position, e.code(), e);
                outcome.rejections.push(Rejection::new(position, &request, &e));
            }
        }
        progress.inc(1);
    }

    outcome
}

fn create_progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
