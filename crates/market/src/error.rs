//! Error types for the futures market-data client.

use thiserror::Error;

/// Errors that can occur when fetching market data.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Exchange answered with a non-success status.
    #[error("Binance API error ({status_code}): {message}")]
    Api { status_code: u16, message: String },

    /// Too many requests.
    #[error("rate limited by exchange: {0}")]
    RateLimit(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout: {0}")]
    Timeout(String),

    /// Response body did not have the expected shape.
    #[error("malformed {endpoint} response: {detail}")]
    Malformed { endpoint: &'static str, detail: String },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl MarketDataError {
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        if status_code == 429 {
            return Self::RateLimit(message.into());
        }
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    pub fn malformed(endpoint: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            endpoint,
            detail: detail.into(),
        }
    }

    /// True for failures that a later request may not hit again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit(_) => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            Self::Malformed { .. } | Self::Configuration(_) => false,
        }
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Malformed {
                endpoint: "response",
                detail: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketDataError>;
