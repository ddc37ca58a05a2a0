//! End-to-end analysis pipeline: targets → harvest → score → records.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use prospector_cache::CacheStore;
use prospector_harvest::Harvester;
use prospector_scoring::Scorer;
use prospector_shared::{
    AnalysisRecord, HarvestConfig, ProspectorError, Result, RunStats, Target,
};

/// Result of one full pipeline run.
#[derive(Debug)]
pub struct AnalysisRun {
    /// One record per input target, in discovery order.
    pub records: Vec<AnalysisRecord>,
    /// Aggregate fetch counters.
    pub stats: RunStats,
    /// Scoring strategy that was active ("remote" or "keyword").
    pub scorer_mode: &'static str,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status. Observational only —
/// implementations must not affect the run.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called periodically while scoring (every 10 targets and at the end).
    fn target_scored(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, run: &AnalysisRun);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn target_scored(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _run: &AnalysisRun) {}
}

/// Run the full pipeline over `targets`.
///
/// One harvest pass for the whole batch, then one scoring call per target.
/// Scoring runs unconditionally, even when the fetch failed outright and only
/// the description is available. Guarantees exactly one record per input
/// target regardless of per-target failures.
#[instrument(skip_all, fields(targets = targets.len()))]
pub async fn run_analysis(
    harvest_config: &HarvestConfig,
    targets: &[Target],
    cache: &Arc<CacheStore>,
    scorer: &Scorer,
    progress: &dyn ProgressReporter,
) -> Result<AnalysisRun> {
    if targets.is_empty() {
        return Err(ProspectorError::validation(
            "no targets to analyze; the input set is empty",
        ));
    }

    let start = Instant::now();
    info!(targets = targets.len(), scorer = scorer.mode(), "starting analysis run");

    // --- Phase 1: Harvest ---
    progress.phase("Harvesting websites");
    let harvester = Harvester::new(harvest_config)?;
    let outcomes = harvester.fetch_many(targets, cache).await;
    debug_assert_eq!(outcomes.len(), targets.len());

    // --- Phase 2: Score ---
    progress.phase("Scoring relevance");
    let total = targets.len();
    let mut records = Vec::with_capacity(total);
    let mut stats = RunStats::default();

    for (i, (target, outcome)) in targets.iter().zip(outcomes).enumerate() {
        stats.record(&outcome.status);

        let score = scorer
            .score(&outcome.text, &target.description, &target.name)
            .await;

        records.push(AnalysisRecord {
            target: target.clone(),
            outcome,
            score,
        });

        if (i + 1) % 10 == 0 || i + 1 == total {
            progress.target_scored(&target.name, i + 1, total);
        }
    }

    let run = AnalysisRun {
        records,
        stats,
        scorer_mode: scorer.mode(),
        elapsed: start.elapsed(),
    };

    progress.done(&run);

    info!(
        records = run.records.len(),
        success = run.stats.success,
        cached = run.stats.cached,
        failed = run.stats.failed,
        timeout = run.stats.timeout,
        exception = run.stats.exception,
        elapsed_ms = run.elapsed.as_millis(),
        "analysis run complete"
    );

    Ok(run)
}
