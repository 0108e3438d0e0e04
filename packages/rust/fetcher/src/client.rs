//! HTTP search client with bounded retry and exponential backoff.
//!
//! One search query maps to one bounded GET request. Transport failures,
//! timeouts, and non-success statuses are transient and retried with delays of
//! `base_delay`, `2 * base_delay`, ... until `max_attempts` is reached. A body
//! that does not decode is fatal immediately: retrying would fetch the same body.

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use skillscope_shared::{FetchConfig, Result, Skill, SkillscopeError};

// ---------------------------------------------------------------------------
// SkillSource
// ---------------------------------------------------------------------------

/// Anything that can answer a bounded search query with a batch of skills.
pub trait SkillSource: Send + Sync {
    /// Return every skill matching `query`, up to `limit` results.
    fn search(&self, query: &str, limit: u32) -> impl Future<Output = Result<Vec<Skill>>> + Send;
}

/// Response body of `GET <base>/search`.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    skills: Vec<Skill>,
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
enum AttemptError {
    /// Worth retrying.
    Transient(String),
    /// Retrying cannot help.
    Fatal(SkillscopeError),
}

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// reqwest-backed [`SkillSource`] for the remote search API.
#[derive(Debug, Clone)]
pub struct SearchClient {
    config: FetchConfig,
    client: Client,
    search_url: Url,
}

impl SearchClient {
    /// Create a new client from the runtime fetch configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let search_url = search_url(&config.base_url)?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| SkillscopeError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            search_url,
        })
    }

    /// The runtime configuration this client was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Run `query` with retries, returning the first successful batch.
    #[instrument(skip(self), fields(max_attempts = self.config.max_attempts))]
    pub async fn search_with_retry(&self, query: &str, limit: u32) -> Result<Vec<Skill>> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            match self.search_once(query, limit).await {
                Ok(skills) => {
                    debug!(attempt = attempt + 1, fetched = skills.len(), "query succeeded");
                    return Ok(skills);
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient(message)) => {
                    if attempt + 1 < max_attempts {
                        let delay = self.config.backoff(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %message,
                            "query failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = message;
                }
            }
        }

        Err(SkillscopeError::fetch(query, max_attempts, last_error))
    }

    /// Issue exactly one request.
    async fn search_once(&self, query: &str, limit: u32) -> std::result::Result<Vec<Skill>, AttemptError> {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &limit.to_string());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Transient(format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AttemptError::Transient(format!("body read failed: {}", describe(&e))))?;

        let parsed: SearchResponse = serde_json::from_slice(&body)
            .map_err(|e| AttemptError::Fatal(SkillscopeError::decode(query, e.to_string())))?;

        Ok(parsed.skills)
    }
}

impl SkillSource for SearchClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Skill>> {
        self.search_with_retry(query, limit).await
    }
}

/// Build `<base>/search` from the configured base URL.
fn search_url(base_url: &str) -> Result<Url> {
    let joined = format!("{}/search", base_url.trim_end_matches('/'));
    Url::parse(&joined)
        .map_err(|e| SkillscopeError::config(format!("invalid api.base_url '{base_url}': {e}")))
}

/// Short description of a reqwest error, flagging timeouts.
fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(base_url: &str) -> FetchConfig {
        FetchConfig {
            base_url: base_url.to_string(),
            limit: 100,
            timeout: Duration::from_secs(5),
            user_agent: "skillscope-test".into(),
            max_attempts: 3,
            base_delay: Duration::from_millis(20),
            concurrency: 2,
        }
    }

    fn body(skills: serde_json::Value) -> serde_json::Value {
        serde_json::json!({ "skills": skills })
    }

    #[test]
    fn search_url_joins_base() {
        let url = search_url("https://skills.sh/api/").unwrap();
        assert_eq!(url.as_str(), "https://skills.sh/api/search");
        assert!(search_url("not a url").is_err());
    }

    #[tokio::test]
    async fn search_sends_query_and_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "sk"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(serde_json::json!([
                {"id": "a", "name": "alpha", "installs": 10, "source": "x/y"}
            ]))))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchClient::new(test_config(&server.uri())).unwrap();
        let skills = client.search("sk", 100).await.unwrap();

        assert_eq!(skills, vec![Skill::new("a", "alpha", 10, "x/y")]);
    }

    #[tokio::test]
    async fn search_decodes_fixture() {
        let server = MockServer::start().await;
        let fixture = std::fs::read_to_string("../../../fixtures/json/search_response.fixture.json")
            .expect("read fixture");

        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture))
            .mount(&server)
            .await;

        let client = SearchClient::new(test_config(&server.uri())).unwrap();
        let skills = client.search("re", 100).await.unwrap();

        assert_eq!(skills.len(), 3);
        assert_eq!(skills[0].owner(), Some("vercel-labs"));
        assert_eq!(skills[0].extra.get("topSource"), Some(&serde_json::json!("github")));
    }

    #[tokio::test]
    async fn retries_twice_then_succeeds() {
        let server = MockServer::start().await;

        // Mounted first, so it answers the first two requests.
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(serde_json::json!([
                {"id": "a", "name": "alpha", "installs": 1, "source": "x/y"}
            ]))))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&server.uri());
        let expected_wait = config.backoff(0) + config.backoff(1);
        let client = SearchClient::new(config).unwrap();

        let start = Instant::now();
        let skills = client.search("sk", 100).await.unwrap();

        assert_eq!(skills.len(), 1);
        assert!(start.elapsed() >= expected_wait);
    }

    #[tokio::test]
    async fn exhausted_retries_are_fatal() {
        let server = MockServer::start().await;

        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = SearchClient::new(test_config(&server.uri())).unwrap();
        let err = client.search("zy", 100).await.unwrap_err();

        match err {
            SkillscopeError::Fetch { query, attempts, message } => {
                assert_eq!(query, "zy");
                assert_eq!(attempts, 3);
                assert!(message.contains("500"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_retried() {
        // Nothing listens on this port once the server is dropped.
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let client = SearchClient::new(test_config(&uri)).unwrap();
        let err = client.search("sk", 100).await.unwrap_err();

        assert!(matches!(err, SkillscopeError::Fetch { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = SearchClient::new(test_config(&server.uri())).unwrap();
        let err = client.search("sk", 100).await.unwrap_err();

        assert!(matches!(err, SkillscopeError::Decode { .. }));
    }

    #[tokio::test]
    async fn missing_skills_key_is_empty_batch() {
        let server = MockServer::start().await;

        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 0})))
            .mount(&server)
            .await;

        let client = SearchClient::new(test_config(&server.uri())).unwrap();
        let skills = client.search("qu", 100).await.unwrap();

        assert!(skills.is_empty());
    }
}
