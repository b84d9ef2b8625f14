// HTTP client for the phishing detector API.
//
// POST /api/check-url classifies one URL; GET /api/health reports whether
// the detector and its phishing database are reachable. Failures are
// mapped onto the VerifyError taxonomy: no response is ServiceUnavailable,
// a non-2xx status is ServiceRejected, an undecodable body is
// MalformedResponse.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{Classifier, ClassifierResponse};
use crate::config::Config;
use crate::verify::error::VerifyError;

/// Thin reqwest wrapper around the detector API.
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpClassifier {
    /// Create a client pointing at `base_url`.
    ///
    /// `timeout` covers the whole request including the body read; hitting
    /// it is reported as `ServiceUnavailable`.
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_url, config.timeout, &config.user_agent)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query the detector's health endpoint.
    pub async fn health(&self) -> Result<HealthReport> {
        let url = format!("{}/api/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Health check request to {url} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Health endpoint returned {}: {}", status, body);
        }

        response
            .json::<HealthReport>()
            .await
            .context("Failed to parse health response")
    }

    fn describe_transport_error(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!("no response within {}s", self.timeout.as_secs_f64())
        } else if error.is_connect() {
            format!("could not connect to {}", self.base_url)
        } else {
            error.to_string()
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, url: &str) -> Result<ClassifierResponse, VerifyError> {
        let endpoint = format!("{}/api/check-url", self.base_url);

        debug!(url, endpoint = %endpoint, "Requesting classification");

        let response = self
            .client
            .post(&endpoint)
            .json(&CheckUrlRequest { url })
            .send()
            .await
            .map_err(|e| VerifyError::ServiceUnavailable(self.describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::rejected(status.as_u16(), &body));
        }

        // A body that stops arriving is a transport problem, not a parse one.
        let body = response
            .bytes()
            .await
            .map_err(|e| VerifyError::ServiceUnavailable(self.describe_transport_error(&e)))?;

        serde_json::from_slice::<ClassifierResponse>(&body)
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))
    }
}

// --- Detector API request/response types ---

#[derive(Serialize)]
struct CheckUrlRequest<'a> {
    url: &'a str,
}

/// Response from `GET /api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Size of the detector's known-phishing table, when it could be read.
    #[serde(default)]
    pub phishing_urls_in_db: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
