//! Deterministic keyword-count scorer.
//!
//! Always available, no external dependency: this is the fallback tier that
//! guarantees every target gets a reproducible score even when the remote
//! semantic service is unconfigured or failing.

use std::collections::{BTreeMap, BTreeSet};

use prospector_shared::{AXIS_MAX, Axis, ScoreResult};

use crate::taxonomy::{NORMALIZATION_FACTOR, TAG_VOCABULARY, axis_keywords};

/// Justification constant marking fallback mode in the output.
pub const FALLBACK_JUSTIFICATION: &str = "Keyword analysis (semantic service unavailable)";

/// Keyword-count scorer over the fixed taxonomy. Stateless; identical inputs
/// yield bit-identical results.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    /// Score page text plus description by keyword occurrence counts.
    ///
    /// Per axis: sum of case-insensitive substring occurrence counts across
    /// the combined text, times [`NORMALIZATION_FACTOR`], clamped to 25.
    pub fn score(&self, text: &str, description: &str) -> ScoreResult {
        let combined = format!("{text} {description}").to_lowercase();

        let mut axis_scores = BTreeMap::new();
        let mut keywords_found: Vec<String> = Vec::new();

        for axis in Axis::ALL {
            let mut count = 0usize;
            for keyword in axis_keywords(axis) {
                let occurrences = combined.matches(keyword).count();
                if occurrences > 0 {
                    count += occurrences;
                    if !keywords_found.iter().any(|k| k == keyword) {
                        keywords_found.push((*keyword).to_string());
                    }
                }
            }
            axis_scores.insert(axis, (count as f64 * NORMALIZATION_FACTOR).min(AXIS_MAX));
        }

        keywords_found.truncate(10);

        let total_score = axis_scores.values().sum();
        let tags = assign_tags(&combined);

        ScoreResult {
            axis_scores,
            total_score,
            tags,
            justification: FALLBACK_JUSTIFICATION.to_string(),
            keywords_found,
        }
    }
}

/// Presence-test tag assignment over the fixed vocabulary.
fn assign_tags(combined_lowercase: &str) -> BTreeSet<String> {
    TAG_VOCABULARY
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| combined_lowercase.contains(kw)))
        .map(|(tag, _)| (*tag).to_string())
        .collect()
}
