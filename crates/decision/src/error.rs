//! Error types for decision acquisition.
//!
//! Transport problems with the reasoning endpoint ([`ReasoningError`]) are
//! kept apart from problems with what the model said ([`ParseError`],
//! [`ValidationError`]). Only the latter are worth a correction round.

use std::time::Duration;

use thiserror::Error;

use crate::acquisition::AttemptRecord;

/// Errors raised while talking to the reasoning endpoint.
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning API error (status {status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout: {0}")]
    Timeout(String),

    /// The endpoint answered but carried no text.
    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    /// All network attempts failed.
    #[error("still failing after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ReasoningError>,
    },
}

impl ReasoningError {
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// True for transport failures and server-side statuses.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            _ => false,
        }
    }

    /// Wait before network attempt `attempt + 1`: `attempt × base`.
    #[must_use]
    pub fn retry_delay(&self, attempt: u32, base: Duration) -> Option<Duration> {
        self.is_retryable().then(|| base * attempt)
    }
}

impl From<reqwest::Error> for ReasoningError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// The response could not be turned into a decision list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no ```json code block found in response")]
    MissingJsonBlock,

    #[error("```json code block is not closed")]
    UnterminatedJsonBlock,

    #[error("JSON parse failed: {reason}\nJSON content: {content}")]
    InvalidJson { reason: String, content: String },
}

/// A decision broke one of the numeric risk rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decision #{index} ({symbol} {action}) failed validation: {reason}")]
pub struct ValidationError {
    /// 1-based position in the decision list.
    pub index: usize,
    pub symbol: String,
    pub action: String,
    pub reason: String,
}

/// Why a single attempt was rejected and needs correction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("failed to extract decisions: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Terminal failures of the acquisition loop.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// The endpoint could not be reached; no correction is attempted.
    #[error("reasoning call failed on attempt {attempt}: {source}")]
    Reasoning {
        attempt: usize,
        #[source]
        source: anyhow::Error,
        attempts: Vec<AttemptRecord>,
    },

    /// Every attempt produced an unusable response.
    #[error("decision still invalid after {} attempts: {last_error}", .attempts.len())]
    Exhausted {
        last_response: String,
        last_error: AttemptError,
        attempts: Vec<AttemptRecord>,
    },
}

impl DecisionError {
    /// Attempt log up to the failure.
    #[must_use]
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            Self::Reasoning { attempts, .. } | Self::Exhausted { attempts, .. } => attempts,
        }
    }

    /// Last raw model response, if one was received.
    #[must_use]
    pub fn last_response(&self) -> Option<&str> {
        match self {
            Self::Exhausted { last_response, .. } => Some(last_response),
            Self::Reasoning { attempts, .. } => attempts.last().map(|a| a.response.as_str()),
        }
    }
}
