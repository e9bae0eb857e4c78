use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{chat_messages, post_json, strip_thinking, BackendError, BackendKind, ChatMessage, SummaryBackend, SummaryRequest};
use common::HostedSettings;

/// Hosted summarizer speaking the OpenAI-compatible chat completions API
pub struct HostedBackend {
    api_url: String,
    api_key: Option<String>,
    api_key_env: String,
    model: String,
    timeout: Duration,
    max_tokens: usize,
    temperature: f32,
    client: reqwest::Client,
}

impl HostedBackend {
    pub fn new(settings: &HostedSettings, client: reqwest::Client) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            api_key_env: settings.api_key_env.clone(),
            model: settings.model.clone(),
            timeout: settings.timeout,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            client,
        }
    }
}

#[async_trait::async_trait]
impl SummaryBackend for HostedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Hosted
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| BackendError::Auth {
            backend: BackendKind::Hosted,
            message: format!("{} environment variable not set", self.api_key_env),
        })?;

        let req_body = OpenAiRequest {
            model: &self.model,
            messages: chat_messages(request),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp_body: OpenAiResponse = post_json(
            &self.client,
            BackendKind::Hosted,
            &self.api_url,
            Some(api_key),
            &req_body,
            self.timeout,
        )
        .await?;

        if let Some(usage) = &resp_body.usage {
            debug!(
                model = resp_body.model.as_deref().unwrap_or(&self.model),
                prompt_tokens = usage.prompt_tokens.unwrap_or(0),
                completion_tokens = usage.completion_tokens.unwrap_or(0),
                "hosted summary received"
            );
        }

        let content = resp_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::format(BackendKind::Hosted, "response has no choices"))?;

        Ok(strip_thinking(&content, request.preserve_thinking))
    }
}

// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<usize>,
    #[serde(default)]
    completion_tokens: Option<usize>,
}
