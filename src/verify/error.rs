// Verification error taxonomy.
//
// Every variant is recoverable: EmptyInput returns control to the user
// without touching the session, and the service-side variants leave the
// orchestrator in Errored until the user submits again. The variants only
// differ for messaging and diagnostics, never for state handling.

use thiserror::Error;

/// Longest response body excerpt kept in a `ServiceRejected` error.
pub const MAX_BODY_EXCERPT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The input was blank after trimming. Never reaches the network.
    #[error("please enter a URL to check")]
    EmptyInput,

    /// No usable response: connection refused, DNS failure, timeout.
    #[error("classification service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service answered with a non-success status.
    #[error("classification service returned {status}: {body}")]
    ServiceRejected { status: u16, body: String },

    /// The service answered but the body is not a verification result.
    #[error("malformed response from classification service: {0}")]
    MalformedResponse(String),
}

impl VerifyError {
    /// Build a `ServiceRejected` error, keeping only a short excerpt of the body.
    pub fn rejected(status: u16, body: &str) -> Self {
        let body = body.trim();
        let excerpt = if body.chars().count() > MAX_BODY_EXCERPT {
            let cut: String = body.chars().take(MAX_BODY_EXCERPT).collect();
            format!("{cut}...")
        } else {
            body.to_string()
        };
        VerifyError::ServiceRejected {
            status,
            body: excerpt,
        }
    }

    /// True for failures that a later submission of the same URL may fix.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, VerifyError::EmptyInput)
    }

    /// Stable label used as the `kind` field in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::EmptyInput => "empty_input",
            VerifyError::ServiceUnavailable(_) => "service_unavailable",
            VerifyError::ServiceRejected { .. } => "service_rejected",
            VerifyError::MalformedResponse(_) => "malformed_response",
        }
    }
}
