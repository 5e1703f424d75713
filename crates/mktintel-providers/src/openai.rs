//! Text generation through an OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{build_client, normalise_base_url, send_json};
use crate::timeout::bounded;
use crate::traits::TextGenerator;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "openai";

const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You are a marketing analyst. When asked for JSON, reply with JSON only.";

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, model, timeout, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(PROVIDER, timeout)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: normalise_base_url(base_url),
            timeout,
        })
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature: TEMPERATURE,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatResponse = send_json(PROVIDER, self.timeout, request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "no message content in first choice"))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate_text(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        bounded(PROVIDER, self.timeout, self.complete(prompt, max_tokens)).await
    }
}
