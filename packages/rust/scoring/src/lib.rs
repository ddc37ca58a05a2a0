//! Relevance scoring: remote semantic tier with a deterministic keyword
//! fallback.
//!
//! [`Scorer`] is the strategy seam: the variant is chosen once at
//! construction from the presence of service credentials, and every remote
//! failure degrades to the keyword tier for that call only — scoring is never
//! fatal for a run.

pub mod keyword;
pub mod remote;
pub mod taxonomy;

use tracing::warn;

use prospector_shared::{AppConfig, Result, ScoreResult, resolve_api_key};

pub use keyword::{FALLBACK_JUSTIFICATION, KeywordScorer};
pub use remote::RemoteScorer;

/// The scoring strategy for one run.
pub enum Scorer {
    /// Remote semantic service, with per-call keyword fallback.
    Remote(RemoteScorer),
    /// Keyword counting only (no credentials configured).
    Keyword(KeywordScorer),
}

impl Scorer {
    /// Choose the strategy from config: remote when the API key env var is
    /// set, keyword otherwise.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match resolve_api_key(config) {
            Some(api_key) => {
                let remote = RemoteScorer::new(
                    api_key,
                    config.semantic.base_url.clone(),
                    config.semantic.model.clone(),
                )?;
                Ok(Scorer::Remote(remote))
            }
            None => {
                warn!(
                    env = %config.semantic.api_key_env,
                    "semantic service not configured, using keyword scoring"
                );
                Ok(Scorer::Keyword(KeywordScorer))
            }
        }
    }

    /// Name of the active strategy, for logs and report metadata.
    pub fn mode(&self) -> &'static str {
        match self {
            Scorer::Remote(_) => "remote",
            Scorer::Keyword(_) => "keyword",
        }
    }

    /// Score one target. Infallible by contract: a remote failure falls back
    /// to the keyword tier for this call.
    pub async fn score(&self, text: &str, description: &str, name: &str) -> ScoreResult {
        match self {
            Scorer::Keyword(keyword) => keyword.score(text, description),
            Scorer::Remote(remote) => match remote.score(text, description, name).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(name, error = %e, "remote scoring failed, falling back to keywords");
                    KeywordScorer.score(text, description)
                }
            },
        }
    }
}
