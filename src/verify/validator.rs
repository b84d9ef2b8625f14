// Input validation — the only gate between typed text and a service call.
//
// Deliberately shallow: trim, reject blanks, forward everything else as-is.
// Scheme normalization and URL-grammar checks belong to the classification
// service, so "not a url" is still a valid submission here.

use std::fmt;

use super::error::VerifyError;

/// A trimmed, non-empty URL string that is allowed to be submitted.
///
/// Only `validate` can construct one, so holding a `ValidatedUrl` proves
/// the blank-input check already ran.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedUrl(String);

impl ValidatedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ValidatedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim `raw_input` and accept it if anything is left.
pub fn validate(raw_input: &str) -> Result<ValidatedUrl, VerifyError> {
    let trimmed = raw_input.trim();
    if trimmed.is_empty() {
        return Err(VerifyError::EmptyInput);
    }
    Ok(ValidatedUrl(trimmed.to_string()))
}
