use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    models::{AnalysisResponse, ReputationVerdict, SubmitResponse},
    UrlClassifier,
};
use crate::model::RiskTier;

pub const DEFAULT_BASE_URL: &str = "https://www.virustotal.com/api/v3";
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct ReputationConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration, // Applies to each outbound call separately
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReputationError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ReputationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HttpError { .. } => "http_status",
            Self::RequestError(e) if e.is_timeout() => "timeout",
            Self::RequestError(_) => "request",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Submit-then-fetch client for a VirusTotal v3 compatible reputation service
#[derive(Clone)]
pub struct ReputationClient {
    client: Client,
    config: ReputationConfig,
}

impl ReputationClient {
    pub fn new(config: ReputationConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Submits the URL for analysis and reads the analysis right away. There is no polling, so
    /// a queued analysis comes back inconclusive
    pub async fn lookup(&self, url: &str) -> Result<ReputationVerdict, ReputationError> {
        let id = self.submit(url).await?;
        debug!(analysis_id = %id, "URL submitted");
        self.fetch_analysis(&id).await
    }

    async fn submit(&self, url: &str) -> Result<String, ReputationError> {
        let endpoint = format!("{}/urls", self.config.base_url);
        let response = self
            .client
            .post(&endpoint)
            .header("x-apikey", &self.config.api_key)
            .form(&[("url", url)])
            .send()
            .await?;

        let body: SubmitResponse = read_json(response).await?;
        Ok(body.data.id)
    }

    async fn fetch_analysis(&self, id: &str) -> Result<ReputationVerdict, ReputationError> {
        let endpoint = format!("{}/analyses/{}", self.config.base_url, id);
        let response = self
            .client
            .get(&endpoint)
            .header("x-apikey", &self.config.api_key)
            .send()
            .await?;

        let body: AnalysisResponse = read_json(response).await?;
        Ok(ReputationVerdict::from(body.data.attributes))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ReputationError> {
    let status = response.status();
    let body = response.text().await?;

    if status != StatusCode::OK {
        return Err(ReputationError::HttpError { status, body });
    }

    serde_json::from_str(&body).map_err(|e| ReputationError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl UrlClassifier for ReputationClient {
    async fn classify(&self, url: &str) -> RiskTier {
        match self.lookup(url).await {
            Ok(verdict) => {
                let tier = verdict.tier();
                debug!(?verdict, %tier, "Reputation lookup done");
                tier
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Reputation lookup failed");
                ReputationVerdict::failed().tier()
            }
        }
    }
}

#[cfg(test)]
mod client_tests {
    use std::time::{Duration, Instant};

    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{ReputationClient, ReputationConfig, ReputationError};
    use crate::model::RiskTier;
    use crate::reputation::UrlClassifier;

    const URL: &str = "https://example.com/login";

    fn test_config(base_url: &str) -> ReputationConfig {
        ReputationConfig {
            base_url: base_url.to_string(),
            api_key: "vt-test-key".to_string(),
            timeout: Duration::from_millis(500),
        }
    }

    fn client(server: &MockServer) -> ReputationClient {
        ReputationClient::new(test_config(&server.uri())).unwrap()
    }

    async fn mount_submit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/urls"))
            .and(header("x-apikey", "vt-test-key"))
            .and(body_string_contains("url=https"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": {"type": "analysis", "id": "u-1"}})),
            )
            .mount(server)
            .await;
    }

    async fn mount_analysis(server: &MockServer, status: &str, stats: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/analyses/u-1"))
            .and(header("x-apikey", "vt-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"id": "u-1", "attributes": {"status": status, "stats": stats}}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn classify_malicious_is_high() {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        let stats = serde_json::json!({"malicious": 3, "suspicious": 0, "harmless": 10});
        mount_analysis(&server, "completed", stats).await;

        assert_eq!(client(&server).classify(URL).await, RiskTier::High);
    }

    #[tokio::test]
    async fn classify_harmless_is_low() {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        let stats = serde_json::json!({"malicious": 0, "suspicious": 0, "harmless": 5});
        mount_analysis(&server, "completed", stats).await;

        assert_eq!(client(&server).classify(URL).await, RiskTier::Low);
    }

    #[tokio::test]
    async fn classify_no_reports_is_medium() {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        let stats = serde_json::json!({"malicious": 0, "suspicious": 0, "harmless": 0});
        mount_analysis(&server, "completed", stats).await;

        assert_eq!(client(&server).classify(URL).await, RiskTier::Medium);
    }

    #[tokio::test]
    async fn classify_queued_analysis_is_medium() {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        let stats = serde_json::json!({"harmless": 7});
        mount_analysis(&server, "queued", stats).await;

        assert_eq!(client(&server).classify(URL).await, RiskTier::Medium);
    }

    #[tokio::test]
    async fn classify_submit_timeout_is_medium() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/urls"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": {"id": "u-1"}}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let start = Instant::now();
        let tier = client(&server).classify(URL).await;
        assert_eq!(tier, RiskTier::Medium);
        assert!(start.elapsed() < Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn lookup_timeout_error_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/urls"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let err = client(&server).lookup(URL).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn classify_server_error_is_medium() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/urls"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let c = client(&server);
        let err = c.lookup(URL).await.unwrap_err();
        assert!(matches!(err, ReputationError::HttpError { ref body, .. } if body == "boom"));
        assert_eq!(c.classify(URL).await, RiskTier::Medium);
    }

    #[tokio::test]
    async fn classify_analysis_not_found_is_medium() {
        let server = MockServer::start().await;
        mount_submit(&server).await;
        Mock::given(method("GET"))
            .and(path("/analyses/u-1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert_eq!(client(&server).classify(URL).await, RiskTier::Medium);
    }

    #[tokio::test]
    async fn classify_malformed_body_is_medium() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/urls"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let c = client(&server);
        let err = c.lookup(URL).await.unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
        assert_eq!(c.classify(URL).await, RiskTier::Medium);
    }

    #[tokio::test]
    async fn classify_unreachable_is_medium() {
        // Nothing listens on the discard port
        let c = ReputationClient::new(test_config("http://127.0.0.1:9")).unwrap();
        assert_eq!(c.classify(URL).await, RiskTier::Medium);
    }
}
