//! Error types for provider operations.

use thiserror::Error;

/// Errors returned by the market-data provider client.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Provider rejected request: {0}")]
    Api(String),

    #[error("Response envelope carried no data")]
    MissingData,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

impl From<url::ParseError> for ProviderError {
    fn from(err: url::ParseError) -> Self {
        ProviderError::InvalidParameters(err.to_string())
    }
}

impl ProviderError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the provider throttled the request.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Returns true if a later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Http { status, .. } => crate::retry::is_retryable_status(*status),
            ProviderError::Network(_) => true,
            _ => false,
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        let err = ProviderError::Http {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.status(), Some(429));
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "HTTP 429: slow down");

        let err = ProviderError::Api("bad address".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_rate_limited());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_classification() {
        let err = ProviderError::Http {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_retryable());
        let err = ProviderError::Http {
            status: 404,
            body: String::new(),
        };
        assert!(!err.is_retryable());
        assert!(ProviderError::Network("reset".to_string()).is_retryable());
        assert!(!ProviderError::MissingData.is_retryable());
    }

    #[test]
    fn test_from_serde_error() {
        let err: ProviderError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ProviderError::Decode(_)));
    }
}
