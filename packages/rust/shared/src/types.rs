//! Core domain types for the harvest-cache-score pipeline.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on extracted page text, in characters.
pub const TEXT_CAP: usize = 3000;

/// Maximum score a single axis can contribute.
pub const AXIS_MAX: f64 = 25.0;

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// One organization to be fetched and scored. Immutable, externally sourced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Stable identifier from the input source.
    pub id: String,
    /// Display name (non-empty by contract).
    pub name: String,
    /// Website URL. May be blank or malformed; the harvester classifies that.
    #[serde(default)]
    pub url: String,
    /// Free-text description from the input source.
    #[serde(default)]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Axis
// ---------------------------------------------------------------------------

/// One of the four fixed scoring dimensions, each worth 0–25 points.
///
/// Variant order is the canonical axis order used for `keywords_found`
/// collection and report output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Document digitization (OCR, scanning, capture).
    Digitization,
    /// Data extraction and valorization (mining, analytics, NLP).
    Extraction,
    /// Certification and trusted-third-party (security, audit, compliance).
    Certification,
    /// Information delivery (dashboards, APIs, portals, sharing).
    Delivery,
}

impl Axis {
    /// All axes in canonical order.
    pub const ALL: [Axis; 4] = [
        Axis::Digitization,
        Axis::Extraction,
        Axis::Certification,
        Axis::Delivery,
    ];

    /// Wire/report key for this axis.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Digitization => "digitization",
            Axis::Extraction => "extraction",
            Axis::Certification => "certification",
            Axis::Delivery => "delivery",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FetchOutcome
// ---------------------------------------------------------------------------

/// Terminal classification of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Fetched over the network and extracted.
    Success,
    /// Served from the cache within its TTL; no network call issued.
    Cached,
    /// Target had a blank/absent URL; nothing to fetch.
    MissingUrl,
    /// Server answered with a non-200 status.
    HttpError(u16),
    /// The request exceeded the per-request timeout.
    Timeout,
    /// Connection, body-read, or parse failure.
    Exception,
}

impl FetchStatus {
    /// Whether this outcome carries usable page text.
    pub fn has_content(&self) -> bool {
        matches!(self, FetchStatus::Success | FetchStatus::Cached)
    }
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStatus::Success => write!(f, "success"),
            FetchStatus::Cached => write!(f, "cached"),
            FetchStatus::MissingUrl => write!(f, "missing_url"),
            FetchStatus::HttpError(code) => write!(f, "http_error({code})"),
            FetchStatus::Timeout => write!(f, "timeout"),
            FetchStatus::Exception => write!(f, "exception"),
        }
    }
}

/// Result of one fetch attempt for one target. Immutable once created;
/// exactly one per target per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// Terminal status for this target.
    pub status: FetchStatus,
    /// `<title>` text, when the page had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Extracted page text, capped at [`TEXT_CAP`] chars. Empty on failure.
    pub text: String,
    /// When the content was fetched (cache hits keep the original stamp).
    pub fetched_at: DateTime<Utc>,
}

impl FetchOutcome {
    /// An empty-text outcome for a failed or skipped fetch.
    pub fn failed(status: FetchStatus) -> Self {
        Self {
            status,
            title: None,
            text: String::new(),
            fetched_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ScoreResult
// ---------------------------------------------------------------------------

/// Relevance scores for one target across the four axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Per-axis scores, each clamped to [0, 25].
    pub axis_scores: BTreeMap<Axis, f64>,
    /// Sum of the axis scores. Always recomputed locally, never trusted
    /// from a remote reply.
    pub total_score: f64,
    /// Assigned category tags from the fixed vocabulary.
    pub tags: BTreeSet<String>,
    /// Human-readable explanation of the scores.
    pub justification: String,
    /// Up to the first 10 distinct matched keywords.
    pub keywords_found: Vec<String>,
}

impl ScoreResult {
    /// Score for a single axis, 0 when absent.
    pub fn axis(&self, axis: Axis) -> f64 {
        self.axis_scores.get(&axis).copied().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// AnalysisRecord
// ---------------------------------------------------------------------------

/// Final unit handed to the result sink: one per input target, in
/// discovery order. Re-sorting by score happens only at reporting time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub target: Target,
    pub outcome: FetchOutcome,
    pub score: ScoreResult,
}

// ---------------------------------------------------------------------------
// RunStats
// ---------------------------------------------------------------------------

/// Aggregate fetch counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub success: usize,
    pub cached: usize,
    /// Missing URLs and non-200 responses.
    pub failed: usize,
    pub timeout: usize,
    pub exception: usize,
}

impl RunStats {
    /// Count one outcome.
    pub fn record(&mut self, status: &FetchStatus) {
        match status {
            FetchStatus::Success => self.success += 1,
            FetchStatus::Cached => self.cached += 1,
            FetchStatus::MissingUrl | FetchStatus::HttpError(_) => self.failed += 1,
            FetchStatus::Timeout => self.timeout += 1,
            FetchStatus::Exception => self.exception += 1,
        }
    }

    /// Total targets counted.
    pub fn total(&self) -> usize {
        self.success + self.cached + self.failed + self.timeout + self.exception
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_serializes_as_snake_case() {
        let json = serde_json::to_string(&Axis::Digitization).expect("serialize");
        assert_eq!(json, r#""digitization""#);
        let parsed: Axis = serde_json::from_str(r#""delivery""#).expect("deserialize");
        assert_eq!(parsed, Axis::Delivery);
    }

    #[test]
    fn axis_order_is_canonical() {
        let mut sorted = vec![Axis::Delivery, Axis::Digitization, Axis::Certification];
        sorted.sort();
        assert_eq!(sorted[0], Axis::Digitization);
        assert_eq!(sorted[2], Axis::Delivery);
    }

    #[test]
    fn fetch_status_content_classification() {
        assert!(FetchStatus::Success.has_content());
        assert!(FetchStatus::Cached.has_content());
        assert!(!FetchStatus::HttpError(404).has_content());
        assert!(!FetchStatus::MissingUrl.has_content());
    }

    #[test]
    fn target_deserializes_with_missing_optionals() {
        let json = r#"{"id": "t1", "name": "Acme"}"#;
        let target: Target = serde_json::from_str(json).expect("deserialize");
        assert_eq!(target.name, "Acme");
        assert!(target.url.is_empty());
        assert!(target.description.is_empty());
    }

    #[test]
    fn run_stats_counters() {
        let mut stats = RunStats::default();
        stats.record(&FetchStatus::Success);
        stats.record(&FetchStatus::Cached);
        stats.record(&FetchStatus::HttpError(500));
        stats.record(&FetchStatus::MissingUrl);
        stats.record(&FetchStatus::Timeout);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.cached, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.timeout, 1);
        assert_eq!(stats.total(), 5);
    }

    #[test]
    fn score_result_axis_lookup_defaults_to_zero() {
        let score = ScoreResult {
            axis_scores: BTreeMap::from([(Axis::Extraction, 12.5)]),
            total_score: 12.5,
            tags: BTreeSet::new(),
            justification: "test".into(),
            keywords_found: vec![],
        };
        assert_eq!(score.axis(Axis::Extraction), 12.5);
        assert_eq!(score.axis(Axis::Delivery), 0.0);
    }
}
