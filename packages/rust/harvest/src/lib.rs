//! Bounded-concurrency, single-hop web harvester.
//!
//! [`Harvester::fetch_many`] fetches one page per target under a semaphore
//! cap, consulting the fetch cache first and classifying every failure mode
//! into a terminal [`FetchStatus`]. Output is index-aligned to the input
//! regardless of completion order; no link-following, no retries.

pub mod extract;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use prospector_cache::{CacheStore, CachedPayload, normalize_url};
use prospector_shared::{FetchOutcome, FetchStatus, HarvestConfig, ProspectorError, Result, Target};

/// User-Agent for harvest requests. Plenty of organization sites answer
/// bot-flavored agents with 403, so this mimics a desktop browser the way
/// the scraping tier always has.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Single-hop HTTP harvester with a shared connection pool.
pub struct Harvester {
    client: Client,
    concurrency: usize,
}

impl Harvester {
    /// Create a new harvester with the given runtime configuration.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR,fr;q=0.9,en;q=0.8"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProspectorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Fetch every target once, at most `concurrency` in flight.
    ///
    /// Returns exactly one [`FetchOutcome`] per target, index-aligned to the
    /// input order irrespective of completion order. Failures never abort the
    /// batch and are never written to the cache.
    #[instrument(skip_all, fields(targets = targets.len(), concurrency = self.concurrency))]
    pub async fn fetch_many(
        &self,
        targets: &[Target],
        cache: &Arc<CacheStore>,
    ) -> Vec<FetchOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let mut handles = Vec::with_capacity(targets.len());
        for target in targets {
            let client = self.client.clone();
            let sem = semaphore.clone();
            let cache = cache.clone();
            let url = target.url.clone();
            let target_id = target.id.clone();

            handles.push(tokio::spawn(async move {
                fetch_one(&client, &cache, &sem, &target_id, &url).await
            }));
        }

        // Awaiting in spawn order keeps the output index-aligned to the input.
        let mut outcomes = Vec::with_capacity(targets.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(error = %e, "fetch task panicked or was cancelled");
                    outcomes.push(FetchOutcome::failed(FetchStatus::Exception));
                }
            }
        }

        info!(outcomes = outcomes.len(), "harvest batch complete");
        outcomes
    }
}

/// Fetch a single target: cache first, then one GET on miss.
async fn fetch_one(
    client: &Client,
    cache: &CacheStore,
    semaphore: &Semaphore,
    target_id: &str,
    raw_url: &str,
) -> FetchOutcome {
    if raw_url.trim().is_empty() {
        debug!(target_id, "blank URL, nothing to fetch");
        return FetchOutcome::failed(FetchStatus::MissingUrl);
    }

    // Cache lookup happens outside the semaphore: a hit costs no network slot.
    if let Some(hit) = cache.get(raw_url).await {
        debug!(target_id, url = raw_url, "cache hit");
        return FetchOutcome {
            status: FetchStatus::Cached,
            title: hit.title,
            text: hit.text,
            fetched_at: hit.fetched_at,
        };
    }

    let url = normalize_url(raw_url);

    let _permit = semaphore.acquire().await.expect("semaphore closed");
    debug!(target_id, %url, "fetching");

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            debug!(target_id, %url, "request timed out");
            return FetchOutcome::failed(FetchStatus::Timeout);
        }
        Err(e) => {
            debug!(target_id, %url, error = %e, "request failed");
            return FetchOutcome::failed(FetchStatus::Exception);
        }
    };

    let status = response.status();
    if status.as_u16() != 200 {
        debug!(target_id, %url, status = status.as_u16(), "non-200 response");
        return FetchOutcome::failed(FetchStatus::HttpError(status.as_u16()));
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) if e.is_timeout() => return FetchOutcome::failed(FetchStatus::Timeout),
        Err(e) => {
            debug!(target_id, %url, error = %e, "body read failed");
            return FetchOutcome::failed(FetchStatus::Exception);
        }
    };

    let page = extract::extract_page(&body);
    let fetched_at = Utc::now();

    let payload = CachedPayload {
        title: page.title.clone(),
        text: page.text.clone(),
        fetched_at,
    };
    // A broken cache must not fail the fetch; the next run simply refetches.
    if let Err(e) = cache.put(&url, &payload).await {
        warn!(target_id, %url, error = %e, "cache write failed");
    }

    FetchOutcome {
        status: FetchStatus::Success,
        title: page.title,
        text: page.text,
        fetched_at,
    }
}

#[cfg(test)]
mod harvester_tests {
    use super::*;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_cache() -> Arc<CacheStore> {
        let tmp = std::env::temp_dir().join(format!("prospector_harvest_{}.db", Uuid::now_v7()));
        Arc::new(
            CacheStore::open(&tmp, chrono::Duration::days(7))
                .await
                .expect("open test cache"),
        )
    }

    fn harvester(concurrency: usize, timeout_secs: u64) -> Harvester {
        Harvester::new(&HarvestConfig {
            concurrency,
            request_timeout_secs: timeout_secs,
        })
        .expect("build harvester")
    }

    fn target(id: &str, url: &str) -> Target {
        Target {
            id: id.into(),
            name: id.to_uppercase(),
            url: url.into(),
            description: String::new(),
        }
    }

    const PAGE: &str = r#"<html>
        <head><title>Acme</title></head>
        <body>
            <nav>Menu</nav>
            <main><p>Document digitization and OCR capture services.</p></main>
            <footer>Contact</footer>
        </body>
    </html>"#;

    #[tokio::test]
    async fn success_extracts_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let cache = test_cache().await;
        let outcomes = harvester(4, 10)
            .fetch_many(&[target("acme", &server.uri())], &cache)
            .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, FetchStatus::Success);
        assert_eq!(outcomes[0].title.as_deref(), Some("Acme"));
        assert!(outcomes[0].text.contains("Document digitization"));
        assert!(!outcomes[0].text.contains("Menu"));

        // Payload landed in the cache.
        assert!(cache.get(&server.uri()).await.is_some());
    }

    #[tokio::test]
    async fn cache_hit_issues_no_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let cache = test_cache().await;
        let h = harvester(4, 10);
        let targets = [target("acme", &server.uri())];

        let first = h.fetch_many(&targets, &cache).await;
        assert_eq!(first[0].status, FetchStatus::Success);

        let second = h.fetch_many(&targets, &cache).await;
        assert_eq!(second[0].status, FetchStatus::Cached);
        assert_eq!(second[0].text, first[0].text);
        // `expect(1)` on the mock verifies the second run hit the network zero times.
    }

    #[tokio::test]
    async fn blank_url_is_missing_and_skips_network() {
        let cache = test_cache().await;
        let outcomes = harvester(4, 10)
            .fetch_many(&[target("acme", "   ")], &cache)
            .await;

        assert_eq!(outcomes[0].status, FetchStatus::MissingUrl);
        assert!(outcomes[0].text.is_empty());
    }

    #[tokio::test]
    async fn non_200_is_http_error_and_never_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let cache = test_cache().await;
        let h = harvester(4, 10);
        let targets = [target("acme", &server.uri())];

        let first = h.fetch_many(&targets, &cache).await;
        assert_eq!(first[0].status, FetchStatus::HttpError(404));
        assert!(first[0].text.is_empty());

        // Failure was not cached, so the next run fetches again.
        let second = h.fetch_many(&targets, &cache).await;
        assert_eq!(second[0].status, FetchStatus::HttpError(404));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PAGE)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let cache = test_cache().await;
        let outcomes = harvester(4, 1)
            .fetch_many(&[target("slow", &server.uri())], &cache)
            .await;

        assert_eq!(outcomes[0].status, FetchStatus::Timeout);
        assert!(cache.get(&server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_host_is_exception() {
        let cache = test_cache().await;
        // Port 1 on localhost refuses connections.
        let outcomes = harvester(4, 10)
            .fetch_many(&[target("dead", "http://127.0.0.1:1/")], &cache)
            .await;

        assert_eq!(outcomes[0].status, FetchStatus::Exception);
    }

    #[tokio::test]
    async fn outcomes_align_with_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let cache = test_cache().await;
        let targets = [
            target("a", &format!("{}/ok", server.uri())),
            target("b", ""),
            target("c", &format!("{}/gone", server.uri())),
            target("d", &format!("{}/ok", server.uri())),
        ];

        let outcomes = harvester(2, 10).fetch_many(&targets, &cache).await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0].status, FetchStatus::Success);
        assert_eq!(outcomes[1].status, FetchStatus::MissingUrl);
        assert_eq!(outcomes[2].status, FetchStatus::HttpError(410));
        // Same URL as index 0: second fetch within the run may be served
        // from the cache written moments earlier.
        assert!(outcomes[3].status.has_content());
    }

    #[tokio::test]
    async fn concurrency_cap_is_enforced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PAGE)
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let cache = test_cache().await;
        // Distinct paths so no request is served from the cache.
        let targets: Vec<Target> = (0..4)
            .map(|i| target(&format!("t{i}"), &format!("{}/page-{i}", server.uri())))
            .collect();

        let start = std::time::Instant::now();
        let outcomes = harvester(2, 10).fetch_many(&targets, &cache).await;
        let elapsed = start.elapsed();

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.status == FetchStatus::Success));
        // Four 300ms responses through two permits need at least two waves.
        assert!(
            elapsed >= Duration::from_millis(550),
            "elapsed {elapsed:?} implies more than 2 fetches in flight"
        );
    }
}
