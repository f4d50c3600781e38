//! Unified error type for negar.

use thiserror::Error;

/// Classification of an upstream API failure, assigned by the backend
/// adapter. The key rotation loop retries only on the first two kinds;
/// it never inspects message text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The API key was rejected as invalid or revoked.
    CredentialInvalid,
    /// The key's quota is exhausted or the project is rate limited.
    QuotaExceeded,
    /// Any other rejection (malformed request, policy block, server fault).
    Other,
}

/// Errors that can occur during generation.
#[derive(Debug, Error)]
pub enum GenError {
    /// Text plate rendering failed.
    #[error("Render error: {0}")]
    Render(String),

    /// An API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// Failure classification used by the key rotation loop.
        kind: ApiErrorKind,
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Every key in the pool failed with a retryable error.
    #[error("All {attempts} API keys are exhausted. Please try again later.")]
    PoolExhausted {
        /// Number of keys tried (the full pool size).
        attempts: usize,
        /// The last underlying key failure.
        #[source]
        source: Box<GenError>,
    },

    /// The API returned a success status but the payload was unusable.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What was wrong with the payload.
        message: String,
        /// Raw payload (truncated) for diagnosis.
        raw: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Image format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// No API keys configured anywhere.
    #[error("No API keys configured. Set GEMINI_API_KEYS (comma separated) or add a [keys] pool to the config file.")]
    MissingApiKeys,
}

impl GenError {
    /// Whether switching to another API key could fix this failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Api {
                kind: ApiErrorKind::CredentialInvalid | ApiErrorKind::QuotaExceeded,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(kind: ApiErrorKind) -> GenError {
        GenError::Api { kind, status: 400, message: "x".into() }
    }

    #[test]
    fn credential_and_quota_are_retryable() {
        assert!(api(ApiErrorKind::CredentialInvalid).is_retryable());
        assert!(api(ApiErrorKind::QuotaExceeded).is_retryable());
    }

    #[test]
    fn other_failures_are_fatal() {
        assert!(!api(ApiErrorKind::Other).is_retryable());
        assert!(!GenError::Render("no surface".into()).is_retryable());
        assert!(!GenError::MalformedResponse { message: "bad".into(), raw: "{}".into() }
            .is_retryable());
    }

    #[test]
    fn pool_exhausted_carries_cause() {
        let err = GenError::PoolExhausted {
            attempts: 3,
            source: Box::new(api(ApiErrorKind::QuotaExceeded)),
        };
        assert!(err.to_string().contains("All 3 API keys"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
