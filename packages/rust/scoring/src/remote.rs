//! Remote semantic scorer.
//!
//! Sends bounded excerpts of the harvested text plus the fixed taxonomy to a
//! messages-style completion endpoint and parses the structured verdict. The
//! reply is validated defensively: missing axes default to 0, every axis is
//! clamped to [0, 25], and the total is always recomputed locally.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use prospector_shared::{AXIS_MAX, Axis, ProspectorError, Result, ScoreResult};

use crate::taxonomy::{TAG_VOCABULARY, axis_definition};

/// Maximum page-text excerpt sent to the service, in characters.
const TEXT_EXCERPT_CAP: usize = 2000;

/// Maximum description excerpt sent to the service, in characters.
const DESCRIPTION_EXCERPT_CAP: usize = 500;

/// Wire protocol version header expected by the service.
const API_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body for the messages endpoint.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// Response body from the messages endpoint.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// The structured verdict embedded in the reply text.
///
/// `total_score` is deliberately not deserialized: it is never trusted and
/// always recomputed from the axis scores.
#[derive(Debug, Deserialize)]
struct RemoteVerdict {
    #[serde(default)]
    scores: BTreeMap<String, f64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    justification: String,
    #[serde(default)]
    keywords_found: Vec<String>,
}

// ---------------------------------------------------------------------------
// RemoteScorer
// ---------------------------------------------------------------------------

/// Client for the remote semantic-analysis service.
pub struct RemoteScorer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl RemoteScorer {
    /// Create a scorer for the service at `base_url` using `model`.
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProspectorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// Score one target remotely. Any error here is a cue for the caller to
    /// fall back to keyword scoring — it is never fatal for the run.
    pub async fn score(&self, text: &str, description: &str, name: &str) -> Result<ScoreResult> {
        let prompt = build_prompt(
            name,
            excerpt(description, DESCRIPTION_EXCERPT_CAP),
            excerpt(text, TEXT_EXCERPT_CAP),
        );

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: 500,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProspectorError::Scoring(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProspectorError::Scoring(format!(
                "service answered HTTP {status}"
            )));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProspectorError::Scoring(format!("invalid response body: {e}")))?;

        let reply = body
            .content
            .first()
            .map(|block| block.text.as_str())
            .ok_or_else(|| ProspectorError::Scoring("empty response content".into()))?;

        let verdict: RemoteVerdict =
            serde_json::from_str(strip_code_fences(reply)).map_err(|e| {
                ProspectorError::Scoring(format!("unparseable verdict: {e}"))
            })?;

        debug!(name, "remote verdict parsed");
        Ok(validate_verdict(verdict))
    }
}

/// Apply the validation rules: missing axes default to 0, clamp each axis to
/// [0, 25], recompute the total locally.
fn validate_verdict(verdict: RemoteVerdict) -> ScoreResult {
    let mut axis_scores = BTreeMap::new();
    for axis in Axis::ALL {
        let raw = verdict.scores.get(axis.as_str()).copied().unwrap_or(0.0);
        axis_scores.insert(axis, raw.clamp(0.0, AXIS_MAX));
    }
    let total_score = axis_scores.values().sum();

    let mut keywords_found = verdict.keywords_found;
    keywords_found.truncate(10);

    ScoreResult {
        axis_scores,
        total_score,
        tags: verdict.tags.into_iter().collect::<BTreeSet<String>>(),
        justification: verdict.justification,
        keywords_found,
    }
}

/// Build the scoring prompt with the fixed taxonomy and bounded excerpts.
fn build_prompt(name: &str, description: &str, content: &str) -> String {
    let mut axes = String::new();
    for (i, axis) in Axis::ALL.iter().enumerate() {
        axes.push_str(&format!(
            "{}. {} — JSON key \"{}\"\n",
            i + 1,
            axis_definition(*axis),
            axis.as_str()
        ));
    }

    let mut tags = String::new();
    for (tag, keywords) in TAG_VOCABULARY {
        tags.push_str(&format!("- {tag} ({})\n", keywords.join(", ")));
    }

    format!(
        "Analyze this organization against these 4 innovation criteria (score 0-25 points each):\n\n\
         {axes}\n\
         Organization: {name}\n\
         Description: {description}\n\
         Website content: {content}\n\n\
         Also classify it with these tags (several possible):\n{tags}\n\
         Reply ONLY with valid JSON:\n\
         {{\n\
             \"scores\": {{\"digitization\": X, \"extraction\": Y, \"certification\": Z, \"delivery\": W}},\n\
             \"total_score\": SUM,\n\
             \"tags\": [\"tag1\", \"tag2\"],\n\
             \"justification\": \"Short explanation of the scores\",\n\
             \"keywords_found\": [\"word1\", \"word2\"]\n\
         }}"
    )
}

/// Strip Markdown code fences some models wrap JSON replies in.
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn excerpt(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scorer(base_url: &str) -> RemoteScorer {
        RemoteScorer::new("test-key".into(), base_url.into(), "test-model".into())
            .expect("build scorer")
    }

    fn messages_reply(verdict_text: &str) -> serde_json::Value {
        serde_json::json!({
            "content": [{"type": "text", "text": verdict_text}]
        })
    }

    #[test]
    fn strips_json_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn excerpt_bounds_are_respected() {
        let text = "x".repeat(3000);
        assert_eq!(excerpt(&text, TEXT_EXCERPT_CAP).len(), 2000);
        assert_eq!(excerpt("short", 500), "short");
    }

    #[test]
    fn prompt_names_every_axis_and_tag() {
        let prompt = build_prompt("Acme", "OCR startup", "We scan documents.");
        for axis in Axis::ALL {
            assert!(prompt.contains(axis.as_str()));
        }
        for (tag, _) in TAG_VOCABULARY {
            assert!(prompt.contains(tag));
        }
        assert!(prompt.contains("Acme"));
    }

    #[test]
    fn verdict_validation_clamps_and_recomputes() {
        let verdict: RemoteVerdict = serde_json::from_str(
            r#"{
                "scores": {"digitization": 30, "extraction": -4, "certification": 10},
                "total_score": 9999,
                "tags": ["Game changer"],
                "justification": "strong OCR focus",
                "keywords_found": ["ocr", "scan"]
            }"#,
        )
        .expect("parse");

        let result = validate_verdict(verdict);
        assert_eq!(result.axis(Axis::Digitization), 25.0);
        assert_eq!(result.axis(Axis::Extraction), 0.0);
        assert_eq!(result.axis(Axis::Certification), 10.0);
        // Missing axis defaults to zero.
        assert_eq!(result.axis(Axis::Delivery), 0.0);
        // The reported total is ignored; the sum is recomputed locally.
        assert_eq!(result.total_score, 35.0);
        assert!(result.tags.contains("Game changer"));
    }

    #[tokio::test]
    async fn scores_from_a_fenced_reply() {
        let server = MockServer::start().await;
        let verdict = "```json\n{\"scores\": {\"digitization\": 20, \"extraction\": 15, \
                       \"certification\": 5, \"delivery\": 10}, \"total_score\": 1, \
                       \"tags\": [\"Prospective\"], \"justification\": \"doc pipeline\", \
                       \"keywords_found\": [\"ocr\"]}\n```";

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({"model": "test-model"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(messages_reply(verdict)))
            .mount(&server)
            .await;

        let result = scorer(&server.uri())
            .score("We scan documents.", "OCR startup", "Acme")
            .await
            .expect("score");

        assert_eq!(result.total_score, 50.0);
        assert_eq!(result.justification, "doc pipeline");
        assert!(result.tags.contains("Prospective"));
        assert_eq!(result.keywords_found, vec!["ocr"]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529))
            .mount(&server)
            .await;

        let result = scorer(&server.uri()).score("text", "desc", "Acme").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unparseable_verdict_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(messages_reply("I would rate this startup highly.")),
            )
            .mount(&server)
            .await;

        let result = scorer(&server.uri()).score("text", "desc", "Acme").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"content": []})),
            )
            .mount(&server)
            .await;

        let result = scorer(&server.uri()).score("text", "desc", "Acme").await;
        assert!(result.is_err());
    }
}
