//! Decision acquisition for the trading cycle.
//!
//! [`context`] turns account state and market snapshots into prompts,
//! [`client`] sends them to the reasoning model, and [`acquisition`] parses
//! and validates the answer, asking for corrections when it breaks a rule.
//! Accepted and failed cycles are written to the [`journal`].

pub mod acquisition;
pub mod client;
pub mod context;
pub mod error;
pub mod journal;
pub mod parser;
pub mod prompt_repository;
pub mod validator;

pub use acquisition::{AttemptRecord, DecisionAcquisition, FullDecision, DEFAULT_MAX_ATTEMPTS};
pub use client::{resolve_endpoint, LlmClient};
pub use context::{build_system_prompt, build_user_prompt, correction_prompt, DecisionContext};
pub use error::{AttemptError, DecisionError, ParseError, ReasoningError, ValidationError};
pub use journal::{DecisionJournal, DecisionRecord};
pub use parser::{extract_cot_trace, extract_decisions, parse_response, ParsedResponse};
pub use prompt_repository::{PromptRepository, PromptTemplate};
pub use validator::{DecisionValidator, ValidationContext};
