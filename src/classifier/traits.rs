// Classifier trait — the seam between the orchestrator and the detector.
//
// The default implementation talks to the phishing detector HTTP API.
// Tests plug in scripted implementations so the orchestrator can be
// exercised without a network.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::verify::error::VerifyError;

/// A classification verdict as sent by the service, before it becomes a
/// `VerificationResult`.
///
/// Only `risk_level` is required. `checked_at` is kept as the raw string so
/// the model layer can decide whether it is trustworthy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassifierResponse {
    #[serde(default)]
    pub url: Option<String>,
    pub risk_level: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub checked_at: Option<String>,
    #[serde(default)]
    pub is_safe: Option<bool>,
    #[serde(default)]
    pub checks: BTreeMap<String, bool>,
}

/// Trait for classifying a URL. Async because real providers sit behind
/// an HTTP API.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one URL. Errors must use the service-side `VerifyError`
    /// variants; `EmptyInput` is the validator's business.
    async fn classify(&self, url: &str) -> Result<ClassifierResponse, VerifyError>;
}
