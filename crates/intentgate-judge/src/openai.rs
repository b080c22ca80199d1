//! OpenAI chat-completions [`JudgeTransport`].

use async_trait::async_trait;
use intentgate_core::TransportError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::judge::JudgeTransport;
use crate::prompt::JudgePrompt;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const MODEL_ENV: &str = "INTENTGATE_MODEL";

const USER_AGENT: &str = concat!("intentgate-judge/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 320;

/// Errors building the transport.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for OpenAiError {
    fn from(err: reqwest::Error) -> Self {
        OpenAiError::Client(err.to_string())
    }
}

/// Connection and sampling settings.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 1500,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Read settings through `lookup`; the API key is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OpenAiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|k| !k.trim().is_empty())
            .ok_or(OpenAiError::MissingApiKey)?;
        let mut config = Self::new(api_key);
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.model = model;
        }
        Ok(config)
    }

    pub fn from_env() -> Result<Self, OpenAiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Sends judge prompts to an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiTransport {
    config: OpenAiConfig,
    http_client: reqwest::Client,
}

impl OpenAiTransport {
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiError> {
        let http_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn from_env() -> Result<Self, OpenAiError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn payload(&self, prompt: &JudgePrompt) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "response_format": { "type": "json_object" },
        })
    }
}

/// Map a non-success status to a transport error; 429 and 5xx are transient.
pub fn classify_status(status: StatusCode, body: &str) -> TransportError {
    let message = format!("chat completion returned {status}: {}", truncate(body, MAX_ERROR_BODY));
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        TransportError::transient(message)
    } else {
        TransportError::permanent(message)
    }
}

fn classify_send_error(err: &reqwest::Error) -> TransportError {
    let message = format!("chat completion request failed: {err}");
    if err.is_timeout() || err.is_connect() || err.is_request() {
        TransportError::transient(message)
    } else {
        TransportError::permanent(message)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl JudgeTransport for OpenAiTransport {
    async fn submit(&self, prompt: &JudgePrompt) -> Result<String, TransportError> {
        let url = self.config.endpoint();
        debug!(url = %url, model = %self.config.model, "submitting judge request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.payload(prompt))
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            TransportError::permanent(format!("invalid chat completion envelope: {e}"))
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| TransportError::permanent("chat completion returned no content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_requires_api_key() {
        assert!(matches!(
            OpenAiConfig::from_lookup(env(&[])),
            Err(OpenAiError::MissingApiKey)
        ));
        assert!(matches!(
            OpenAiConfig::from_lookup(env(&[(API_KEY_ENV, "  ")])),
            Err(OpenAiError::MissingApiKey)
        ));
    }

    #[test]
    fn test_config_overrides() {
        let cfg = OpenAiConfig::from_lookup(env(&[
            (API_KEY_ENV, "sk-test"),
            (BASE_URL_ENV, "http://localhost:8080/v1/"),
            (MODEL_ENV, "gpt-4o"),
        ]))
        .unwrap();
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert!(!format!("{cfg:?}").contains("sk-test"));
    }

    #[test]
    fn test_payload_shape() {
        let transport = OpenAiTransport::new(OpenAiConfig::new("k")).unwrap();
        let payload = transport.payload(&JudgePrompt {
            system: "sys".into(),
            user: "usr".into(),
        });
        assert_eq!(payload["model"], DEFAULT_MODEL);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "usr");
        assert_eq!(payload["response_format"]["type"], "json_object");
        assert_eq!(payload["max_tokens"], 1500);
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, "").retryable);
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down").retryable);
        assert!(!classify_status(StatusCode::UNAUTHORIZED, "bad key").retryable);
        assert!(!classify_status(StatusCode::BAD_REQUEST, "").retryable);
        let long = "x".repeat(1000);
        assert!(classify_status(StatusCode::BAD_GATEWAY, &long).message.len() < 400);
    }
}
