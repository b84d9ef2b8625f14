// Data models — the types that flow from the orchestrator to presentation.
//
// Everything here is plain data. Results are immutable once built, and the
// history only grows at the front, so a presentation layer can hold a clone
// without worrying about it changing underneath.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::VerifyError;
use super::validator::{self, ValidatedUrl};
use crate::classifier::traits::ClassifierResponse;

/// A single user intent to check a URL, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    raw_input: String,
}

impl VerificationRequest {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
        }
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    /// Run the input validator over the raw text.
    pub fn validate(&self) -> Result<ValidatedUrl, VerifyError> {
        validator::validate(&self.raw_input)
    }
}

/// Risk verdict reported by the classification service.
///
/// The service speaks a closed vocabulary, but anything it sends outside
/// of it lands in `Unknown` with the original value kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Safe,
    Suspicious,
    Malicious,
    Unknown(String),
}

impl RiskLevel {
    /// Parse a service value. Only the exact lowercase names are known;
    /// "SAFE" or " safe" is as foreign as "critical".
    pub fn parse(raw: &str) -> Self {
        match raw {
            "safe" => RiskLevel::Safe,
            "suspicious" => RiskLevel::Suspicious,
            "malicious" => RiskLevel::Malicious,
            _ => RiskLevel::Unknown(raw.to_string()),
        }
    }

    /// Canonical lowercase name; every unrecognized value reads as "unknown".
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Suspicious => "suspicious",
            RiskLevel::Malicious => "malicious",
            RiskLevel::Unknown(_) => "unknown",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "Safe",
            RiskLevel::Suspicious => "Suspicious",
            RiskLevel::Malicious => "Malicious",
            RiskLevel::Unknown(_) => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RiskLevel::Unknown(_))
    }
}

impl From<String> for RiskLevel {
    fn from(raw: String) -> Self {
        RiskLevel::parse(&raw)
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of one completed check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    url: String,
    risk_level: RiskLevel,
    details: Vec<String>,
    checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_safe: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    checks: BTreeMap<String, bool>,
}

impl VerificationResult {
    pub fn new(
        url: impl Into<String>,
        risk_level: RiskLevel,
        details: Vec<String>,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            risk_level,
            details,
            checked_at,
            is_safe: None,
            checks: BTreeMap::new(),
        }
    }

    /// Build a result from a service response.
    ///
    /// `url` is the string that was actually submitted, which wins over any
    /// echo in the response. `completed_at` stamps the result when the
    /// service timestamp is missing or cannot be read unambiguously.
    pub fn from_response(
        url: String,
        response: ClassifierResponse,
        completed_at: DateTime<Utc>,
    ) -> Self {
        if let Some(echoed) = response.url.as_deref() {
            if echoed != url {
                debug!(submitted = %url, echoed, "Service echoed a different URL");
            }
        }

        let checked_at = resolve_checked_at(response.checked_at.as_deref(), completed_at);

        Self {
            url,
            risk_level: RiskLevel::parse(&response.risk_level),
            details: response.details,
            checked_at,
            is_safe: response.is_safe,
            checks: response.checks,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn risk_level(&self) -> &RiskLevel {
        &self.risk_level
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// The service's own safe/unsafe flag, if it sent one.
    pub fn is_safe(&self) -> Option<bool> {
        self.is_safe
    }

    /// Named heuristic flags reported by the service, ordered by name.
    pub fn checks(&self) -> &BTreeMap<String, bool> {
        &self.checks
    }
}

/// Pick the timestamp for a result.
///
/// RFC 3339 values carry their own offset and are used directly. Naive
/// ISO-8601 values are read as local time, but only when that local time
/// maps to exactly one instant. Anything else falls back to `completed_at`.
pub fn resolve_checked_at(raw: Option<&str>, completed_at: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return completed_at;
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        if let Some(local) = Local.from_local_datetime(&naive).single() {
            return local.with_timezone(&Utc);
        }
    }

    debug!(raw, "Unusable checked_at from service, using completion time");
    completed_at
}

/// The session's checked results, newest first.
///
/// Append-only and unbounded for the life of the session. Re-checking a
/// URL adds a new entry rather than replacing the old one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: VecDeque<VerificationResult>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn prepend(&mut self, result: VerificationResult) {
        self.entries.push_front(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently completed check.
    pub fn latest(&self) -> Option<&VerificationResult> {
        self.entries.front()
    }

    pub fn get(&self, index: usize) -> Option<&VerificationResult> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VerificationResult> {
        self.entries.iter()
    }

    /// Count entries at each risk level: (safe, suspicious, malicious, unknown).
    pub fn tally(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for entry in &self.entries {
            match entry.risk_level {
                RiskLevel::Safe => counts.0 += 1,
                RiskLevel::Suspicious => counts.1 += 1,
                RiskLevel::Malicious => counts.2 += 1,
                RiskLevel::Unknown(_) => counts.3 += 1,
            }
        }
        counts
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a VerificationResult;
    type IntoIter = std::collections::vec_deque::Iter<'a, VerificationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Where the orchestrator is in its submission lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Errored,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::InFlight => "in_flight",
            SubmissionState::Errored => "errored",
        }
    }

    /// Whether a new submission would be accepted.
    pub fn accepts_submissions(&self) -> bool {
        !matches!(self, SubmissionState::InFlight)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time copy of the session for presentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: SubmissionState,
    pub history: History,
    /// The failure that put the session in `Errored`, cleared on the next submit.
    pub last_error: Option<VerifyError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_prepends_newest_first() {
        let mut history = History::new();
        let t = Utc::now();
        history.prepend(VerificationResult::new("a", RiskLevel::Safe, vec![], t));
        history.prepend(VerificationResult::new("b", RiskLevel::Malicious, vec![], t));
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().url(), "b");
        assert_eq!(history.get(1).unwrap().url(), "a");
    }

    #[test]
    fn history_keeps_duplicate_urls() {
        let mut history = History::new();
        let t = Utc::now();
        history.prepend(VerificationResult::new("same", RiskLevel::Safe, vec![], t));
        history.prepend(VerificationResult::new("same", RiskLevel::Safe, vec![], t));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn tally_counts_every_level() {
        let mut history = History::new();
        let t = Utc::now();
        for level in [
            RiskLevel::Safe,
            RiskLevel::Safe,
            RiskLevel::Suspicious,
            RiskLevel::Malicious,
            RiskLevel::Unknown("weird".into()),
        ] {
            history.prepend(VerificationResult::new("u", level, vec![], t));
        }
        assert_eq!(history.tally(), (2, 1, 1, 1));
    }

    #[test]
    fn in_flight_rejects_submissions() {
        assert!(SubmissionState::Idle.accepts_submissions());
        assert!(SubmissionState::Errored.accepts_submissions());
        assert!(!SubmissionState::InFlight.accepts_submissions());
    }
}
