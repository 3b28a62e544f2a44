//! Splits a raw model response into its reasoning trace and decision list.
//!
//! Expected shape: free prose, then one fenced block opened with ```` ```json ````
//! holding either an array of decisions or a single decision object.

use algo_trade_core::Decision;

use crate::error::ParseError;

const JSON_FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Reasoning trace plus the decisions found in one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub cot_trace: String,
    pub decisions: Vec<Decision>,
}

/// Text before the first JSON fence, or the whole response when there is none.
#[must_use]
pub fn extract_cot_trace(response: &str) -> String {
    match response.find(JSON_FENCE_OPEN) {
        Some(start) => response[..start].trim().to_string(),
        None => response.trim().to_string(),
    }
}

/// Decisions from the first JSON fence.
///
/// # Errors
/// Fails when the fence is missing or unterminated, or when its content is
/// neither a decision array nor a single decision object.
pub fn extract_decisions(response: &str) -> Result<Vec<Decision>, ParseError> {
    let start = response
        .find(JSON_FENCE_OPEN)
        .ok_or(ParseError::MissingJsonBlock)?
        + JSON_FENCE_OPEN.len();
    let len = response[start..]
        .find(FENCE_CLOSE)
        .ok_or(ParseError::UnterminatedJsonBlock)?;

    let content = straighten_quotes(response[start..start + len].trim());

    match serde_json::from_str::<Vec<Decision>>(&content) {
        Ok(decisions) => Ok(decisions),
        Err(array_err) => match serde_json::from_str::<Decision>(&content) {
            Ok(single) => Ok(vec![single]),
            Err(object_err) => {
                let reason = if content.starts_with('{') { object_err } else { array_err };
                Err(ParseError::InvalidJson {
                    reason: reason.to_string(),
                    content,
                })
            }
        },
    }
}

/// Runs both extractions.
///
/// # Errors
/// See [`extract_decisions`].
pub fn parse_response(response: &str) -> Result<ParsedResponse, ParseError> {
    Ok(ParsedResponse {
        cot_trace: extract_cot_trace(response),
        decisions: extract_decisions(response)?,
    })
}

/// Replaces typographic quotes that input methods substitute for ASCII ones.
#[must_use]
pub fn straighten_quotes(json: &str) -> String {
    json.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}
