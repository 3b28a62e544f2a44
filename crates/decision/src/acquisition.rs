//! Self-correcting decision acquisition.
//!
//! Each attempt moves through `Requesting → Parsing → Validating`. A parse or
//! validation failure moves to `Correcting`, which builds a correction prompt
//! and requests again until the attempt budget runs out. A failed reasoning
//! call ends the loop immediately.

use std::sync::Arc;

use algo_trade_core::{Decision, ReasoningClient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::context::correction_prompt;
use crate::error::{AttemptError, DecisionError};
use crate::parser::{parse_response, ParsedResponse};
use crate::validator::{DecisionValidator, ValidationContext};

/// Model calls per cycle, including the first.
pub const DEFAULT_MAX_ATTEMPTS: usize = 2;

/// One request/response exchange. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: usize,
    pub prompt: String,
    /// Empty when the reasoning call itself failed.
    pub response: String,
    pub error: Option<String>,
}

/// An accepted, fully validated decision set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullDecision {
    pub system_prompt: String,
    /// The original request, without any correction wrapping.
    pub user_prompt: String,
    pub cot_trace: String,
    pub decisions: Vec<Decision>,
    pub raw_response: String,
    pub timestamp: DateTime<Utc>,
    pub attempts: Vec<AttemptRecord>,
}

impl FullDecision {
    #[must_use]
    pub fn corrections(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }
}

enum AcquisitionState {
    Requesting {
        attempt: usize,
        prompt: String,
    },
    Parsing {
        attempt: usize,
        prompt: String,
        raw: String,
    },
    Validating {
        attempt: usize,
        prompt: String,
        raw: String,
        parsed: ParsedResponse,
    },
    Correcting {
        attempt: usize,
        raw: String,
        error: AttemptError,
    },
}

pub struct DecisionAcquisition {
    client: Arc<dyn ReasoningClient>,
    validator: DecisionValidator,
    max_attempts: usize,
}

impl DecisionAcquisition {
    #[must_use]
    pub fn new(client: Arc<dyn ReasoningClient>, validator: DecisionValidator) -> Self {
        Self {
            client,
            validator,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn validator(&self) -> &DecisionValidator {
        &self.validator
    }

    /// Runs the loop to acceptance or terminal failure.
    ///
    /// # Errors
    /// [`DecisionError::Reasoning`] when the endpoint fails, and
    /// [`DecisionError::Exhausted`] when no attempt produced a valid set.
    pub async fn acquire(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        ctx: &ValidationContext,
    ) -> Result<FullDecision, DecisionError> {
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut state = AcquisitionState::Requesting {
            attempt: 1,
            prompt: user_prompt.to_string(),
        };

        loop {
            state = match state {
                AcquisitionState::Requesting { attempt, prompt } => {
                    debug!(attempt, "Requesting decision");
                    match self.client.complete(system_prompt, &prompt).await {
                        Ok(raw) => AcquisitionState::Parsing { attempt, prompt, raw },
                        Err(source) => {
                            error!(attempt, error = %source, "Reasoning call failed");
                            attempts.push(AttemptRecord {
                                attempt,
                                prompt,
                                response: String::new(),
                                error: Some(format!("{source:#}")),
                            });
                            return Err(DecisionError::Reasoning {
                                attempt,
                                source,
                                attempts,
                            });
                        }
                    }
                }

                AcquisitionState::Parsing { attempt, prompt, raw } => match parse_response(&raw) {
                    Ok(parsed) => AcquisitionState::Validating {
                        attempt,
                        prompt,
                        raw,
                        parsed,
                    },
                    Err(e) => {
                        let error = AttemptError::from(e);
                        attempts.push(AttemptRecord {
                            attempt,
                            prompt,
                            response: raw.clone(),
                            error: Some(error.to_string()),
                        });
                        AcquisitionState::Correcting { attempt, raw, error }
                    }
                },

                AcquisitionState::Validating {
                    attempt,
                    prompt,
                    raw,
                    parsed,
                } => match self.validator.validate_all(&parsed.decisions, ctx) {
                    Ok(()) => {
                        attempts.push(AttemptRecord {
                            attempt,
                            prompt,
                            response: raw.clone(),
                            error: None,
                        });
                        info!(
                            attempt,
                            decisions = parsed.decisions.len(),
                            "Decision set accepted"
                        );
                        return Ok(FullDecision {
                            system_prompt: system_prompt.to_string(),
                            user_prompt: user_prompt.to_string(),
                            cot_trace: parsed.cot_trace,
                            decisions: parsed.decisions,
                            raw_response: raw,
                            timestamp: Utc::now(),
                            attempts,
                        });
                    }
                    Err(e) => {
                        let error = AttemptError::from(e);
                        attempts.push(AttemptRecord {
                            attempt,
                            prompt,
                            response: raw.clone(),
                            error: Some(error.to_string()),
                        });
                        AcquisitionState::Correcting { attempt, raw, error }
                    }
                },

                AcquisitionState::Correcting { attempt, raw, error } => {
                    if attempt >= self.max_attempts {
                        error!(attempts = attempt, error = %error, "Decision acquisition failed");
                        return Err(DecisionError::Exhausted {
                            last_response: raw,
                            last_error: error,
                            attempts,
                        });
                    }
                    warn!(attempt, error = %error, "Decision rejected, requesting correction");
                    AcquisitionState::Requesting {
                        attempt: attempt + 1,
                        prompt: correction_prompt(&error.to_string(), user_prompt, &raw),
                    }
                }
            };
        }
    }
}
