//! HTTP client for the reasoning model.
//!
//! DeepSeek, Qwen and custom endpoints speak the OpenAI chat-completions
//! format. Gemini uses `generateContent` with the key in the query string.
//! Transport failures are retried with a linearly growing delay.

use std::time::Duration;

use algo_trade_core::{ReasoningClient, ReasoningConfig, ReasoningProvider};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::ReasoningError;

/// Output cap sent to Gemini, which ignores `max_tokens`.
pub const GEMINI_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Base wait between network attempts; attempt `n` waits `n × base`.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct LlmClient {
    http: Client,
    provider: ReasoningProvider,
    endpoint: String,
    model: String,
    api_key: SecretString,
    temperature: f64,
    max_tokens: u32,
    max_attempts: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Builds a client for the configured provider.
    ///
    /// # Errors
    /// Fails when the API key is empty, when a custom provider has no URL or
    /// model, or when the HTTP client cannot be built.
    pub fn from_config(config: &ReasoningConfig) -> Result<Self, ReasoningError> {
        if config.api_key.trim().is_empty() {
            return Err(ReasoningError::Configuration("reasoning API key is not set".to_string()));
        }

        let base_url = if config.base_url.is_empty() {
            config.provider.default_base_url().to_string()
        } else {
            config.base_url.clone()
        };
        if base_url.is_empty() {
            return Err(ReasoningError::Configuration(
                "custom provider requires reasoning.base_url".to_string(),
            ));
        }

        let model = if config.model.is_empty() {
            config.provider.default_model().to_string()
        } else {
            config.model.clone()
        };
        if model.is_empty() {
            return Err(ReasoningError::Configuration(
                "custom provider requires reasoning.model".to_string(),
            ));
        }

        let endpoint = resolve_endpoint(config.provider, &base_url, &model);

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReasoningError::Configuration(format!("failed to build HTTP client: {e}")))?;

        info!(provider = ?config.provider, %model, %endpoint, "Reasoning client configured");

        Ok(Self {
            http,
            provider: config.provider,
            endpoint,
            model,
            api_key: SecretString::from(config.api_key.clone()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_attempts: config.max_network_attempts.max(1),
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one prompt pair, retrying transport failures.
    ///
    /// # Errors
    /// Non-retryable failures are returned at once. Retryable ones are
    /// wrapped in [`ReasoningError::RetriesExhausted`] after the last attempt.
    pub async fn call(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ReasoningError> {
        let mut attempt = 1;
        loop {
            let err = match self.send(system_prompt, user_prompt).await {
                Ok(text) => {
                    debug!(attempt, chars = text.len(), "Reasoning response received");
                    return Ok(text);
                }
                Err(e) => e,
            };

            let Some(delay) = err.retry_delay(attempt, self.retry_delay) else {
                return Err(err);
            };
            if attempt >= self.max_attempts {
                return Err(ReasoningError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Reasoning call failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ReasoningError> {
        match self.provider {
            ReasoningProvider::Gemini => self.send_gemini(system_prompt, user_prompt).await,
            ReasoningProvider::DeepSeek | ReasoningProvider::Qwen | ReasoningProvider::Custom => {
                self.send_chat(system_prompt, user_prompt).await
            }
        }
    }

    async fn send_chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ReasoningError> {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user_prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let parsed: ChatResponse = check_status(response).await?.json().await?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ReasoningError::EmptyResponse {
                provider: "chat completions",
            })
    }

    async fn send_gemini(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ReasoningError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": system_prompt }, { "text": user_prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": GEMINI_MAX_OUTPUT_TOKENS
            }
        });

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await?;
        let parsed: GeminiResponse = check_status(response).await?.json().await?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ReasoningError::EmptyResponse { provider: "gemini" })
    }
}

#[async_trait]
impl ReasoningClient for LlmClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String> {
        Ok(self.call(system_prompt, user_prompt).await?)
    }
}

/// Full request URL for a provider.
///
/// A trailing `#` on a chat base URL means "use as-is".
#[must_use]
pub fn resolve_endpoint(provider: ReasoningProvider, base_url: &str, model: &str) -> String {
    match provider {
        ReasoningProvider::Gemini => format!(
            "{}/models/{model}:generateContent",
            base_url.trim_end_matches('/')
        ),
        _ => match base_url.strip_suffix('#') {
            Some(verbatim) => verbatim.to_string(),
            None => format!("{}/chat/completions", base_url.trim_end_matches('/')),
        },
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ReasoningError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ReasoningError::api(status.as_u16(), text))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(provider: ReasoningProvider, base_url: &str) -> ReasoningConfig {
        ReasoningConfig {
            provider,
            base_url: base_url.to_string(),
            api_key: "sk-test".to_string(),
            ..ReasoningConfig::default()
        }
    }

    fn client(provider: ReasoningProvider, base_url: &str) -> LlmClient {
        LlmClient::from_config(&config(provider, base_url))
            .unwrap()
            .with_retry_delay(Duration::from_millis(1))
    }

    fn chat_reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }))
    }

    // ============================================
    // Endpoint Resolution
    // ============================================

    #[test]
    fn test_resolve_endpoint() {
        assert_eq!(
            resolve_endpoint(ReasoningProvider::DeepSeek, "https://api.deepseek.com/v1/", "deepseek-chat"),
            "https://api.deepseek.com/v1/chat/completions"
        );
        assert_eq!(
            resolve_endpoint(ReasoningProvider::Custom, "https://proxy.local/v2/generate#", "m"),
            "https://proxy.local/v2/generate"
        );
        assert_eq!(
            resolve_endpoint(ReasoningProvider::Gemini, "https://g.example/v1beta", "gemini-1.5-pro"),
            "https://g.example/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_configuration_errors() {
        let mut cfg = config(ReasoningProvider::DeepSeek, "");
        cfg.api_key = String::new();
        assert!(matches!(
            LlmClient::from_config(&cfg),
            Err(ReasoningError::Configuration(_))
        ));

        let custom = config(ReasoningProvider::Custom, "");
        assert!(LlmClient::from_config(&custom).is_err());

        let qwen = LlmClient::from_config(&config(ReasoningProvider::Qwen, "")).unwrap();
        assert_eq!(qwen.model(), "qwen-max");
        assert!(qwen.endpoint().starts_with("https://dashscope.aliyuncs.com"));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = client(ReasoningProvider::DeepSeek, "http://localhost");
        assert!(!format!("{client:?}").contains("sk-test"));
    }

    // ============================================
    // Requests
    // ============================================

    #[tokio::test]
    async fn test_chat_completion_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "deepseek-chat",
                "messages": [
                    { "role": "system", "content": "SYS" },
                    { "role": "user", "content": "USER" }
                ],
                "max_tokens": 2000
            })))
            .respond_with(chat_reply("analysis"))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(ReasoningProvider::DeepSeek, &server.uri())
            .call("SYS", "USER")
            .await
            .unwrap();
        assert_eq!(text, "analysis");
    }

    #[tokio::test]
    async fn test_verbatim_custom_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/generate"))
            .respond_with(chat_reply("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = config(ReasoningProvider::Custom, &format!("{}/v2/generate#", server.uri()));
        cfg.model = "local-model".to_string();
        let client = LlmClient::from_config(&cfg).unwrap();
        assert_eq!(client.call("", "hi").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_gemini_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(query_param("key", "sk-test"))
            .and(body_partial_json(json!({
                "generationConfig": { "maxOutputTokens": 8192 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "gemini says" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(ReasoningProvider::Gemini, &server.uri())
            .call("SYS", "USER")
            .await
            .unwrap();
        assert_eq!(text, "gemini says");
    }

    #[tokio::test]
    async fn test_empty_content_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_reply("   "))
            .mount(&server)
            .await;

        let err = client(ReasoningProvider::DeepSeek, &server.uri())
            .call("SYS", "USER")
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::EmptyResponse { .. }));
    }

    // ============================================
    // Retry
    // ============================================

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(chat_reply("second time lucky"))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(ReasoningProvider::DeepSeek, &server.uri())
            .call("SYS", "USER")
            .await
            .unwrap();
        assert_eq!(text, "second time lucky");
    }

    #[tokio::test]
    async fn test_auth_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(ReasoningProvider::DeepSeek, &server.uri())
            .call("SYS", "USER")
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::Api { status_code: 401, .. }));
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(ReasoningProvider::DeepSeek, &server.uri())
            .call("SYS", "USER")
            .await
            .unwrap_err();
        match err {
            ReasoningError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.is_retryable());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
