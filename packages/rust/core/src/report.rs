//! JSON report assembly for a completed analysis run.
//!
//! The pipeline keeps records in discovery order; re-sorting by total score
//! happens here, at the reporting boundary, and nowhere else.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prospector_shared::{AnalysisRecord, RunStats};

use crate::pipeline::AnalysisRun;

/// The exported report document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Records sorted by total score, descending.
    pub results: Vec<AnalysisRecord>,
    pub summary: ReportSummary,
}

/// Run-level metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub target_count: usize,
    /// Scoring strategy that was active ("remote" or "keyword").
    pub scorer_mode: String,
    pub fetch_stats: RunStats,
    pub elapsed_ms: u64,
}

/// Aggregate statistics over the scored records.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportSummary {
    pub average_score: f64,
    pub max_score: f64,
    /// How many records carry each tag.
    pub tag_distribution: BTreeMap<String, usize>,
}

/// Build the report from a completed run.
pub fn build_report(run: &AnalysisRun) -> Report {
    let mut results = run.records.clone();
    results.sort_by(|a, b| {
        b.score
            .total_score
            .partial_cmp(&a.score.total_score)
            .unwrap_or(Ordering::Equal)
    });

    let count = results.len();
    let total_sum: f64 = results.iter().map(|r| r.score.total_score).sum();
    let average_score = if count > 0 { total_sum / count as f64 } else { 0.0 };
    let max_score = results
        .first()
        .map(|r| r.score.total_score)
        .unwrap_or(0.0);

    let mut tag_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for record in &results {
        for tag in &record.score.tags {
            *tag_distribution.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    Report {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            target_count: count,
            scorer_mode: run.scorer_mode.to_string(),
            fetch_stats: run.stats,
            elapsed_ms: run.elapsed.as_millis() as u64,
        },
        results,
        summary: ReportSummary {
            average_score,
            max_score,
            tag_distribution,
        },
    }
}
