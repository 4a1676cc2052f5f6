// error.rs - fault and outcome error types.
//
// Faults (things that prevent a call from producing any outcome at all, and
// propagate out of it or reject construction) and outcomes (negative
// results returned as data) are kept as separate types on purpose.
// `ClientError` is the former, `AuthError` is the latter.

use serde::Serialize;
use thiserror::Error;

/// A fault: something that prevents a call from producing any outcome at
/// all. Distinct from `AuthError`, which is a value inside a successful
/// `AuthOutcome`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("shared secret must not be empty")]
    MissingSecret,

    #[error("invalid valuePattern regex: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// The six negative-outcome labels carried on `AuthOutcome::error`. These
/// are data, not faults: a reject or timeout is a normal, expected result
/// of calling `authenticate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthError {
    Timeout,
    MalformedResponse,
    AuthenticatorMismatch,
    AccessReject,
    AccessChallenge,
    UnknownCode,
}

impl AuthError {
    /// The lowercase wire-format string for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthError::Timeout => "timeout",
            AuthError::MalformedResponse => "malformed_response",
            AuthError::AuthenticatorMismatch => "authenticator_mismatch",
            AuthError::AccessReject => "access_reject",
            AuthError::AccessChallenge => "access_challenge",
            AuthError::UnknownCode => "unknown_code",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_strings_are_lowercase_snake_case() {
        assert_eq!(AuthError::Timeout.as_str(), "timeout");
        assert_eq!(AuthError::MalformedResponse.as_str(), "malformed_response");
        assert_eq!(AuthError::AuthenticatorMismatch.as_str(), "authenticator_mismatch");
        assert_eq!(AuthError::AccessReject.as_str(), "access_reject");
        assert_eq!(AuthError::AccessChallenge.as_str(), "access_challenge");
        assert_eq!(AuthError::UnknownCode.as_str(), "unknown_code");
    }
}
