// User-supplied HTTP endpoint backend
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{chat_messages, post_json, strip_thinking, BackendError, BackendKind, ChatMessage, SummaryBackend, SummaryRequest};
use common::CustomSettings;

/// Summarizer for an arbitrary chat-style endpoint.
///
/// The reply shape is not known in advance, so the text is taken from the
/// first recognised field: `choices[0].message.content` (OpenAI style),
/// `content` (a string, or Anthropic-style text blocks), `text`, and
/// finally the whole JSON document.
pub struct CustomEndpointBackend {
    api_url: String,
    api_key: Option<String>,
    timeout: Duration,
    max_tokens: usize,
    temperature: f32,
    client: reqwest::Client,
}

impl CustomEndpointBackend {
    pub fn new(api_url: impl Into<String>, settings: &CustomSettings, client: reqwest::Client) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: settings.api_key.clone(),
            timeout: settings.timeout,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            client,
        }
    }
}

#[async_trait::async_trait]
impl SummaryBackend for CustomEndpointBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::CustomEndpoint
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError> {
        let req_body = CustomRequest {
            messages: chat_messages(request),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let reply: Value = post_json(
            &self.client,
            BackendKind::CustomEndpoint,
            &self.api_url,
            self.api_key.as_deref(),
            &req_body,
            self.timeout,
        )
        .await?;

        let text = extract_reply_text(&reply)?;
        Ok(strip_thinking(&text, request.preserve_thinking))
    }
}

#[derive(Debug, Serialize)]
struct CustomRequest {
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

fn extract_reply_text(reply: &Value) -> Result<String, BackendError> {
    if let Some(choices) = reply.get("choices") {
        return choices
            .pointer("/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BackendError::format(BackendKind::CustomEndpoint, "choices[0].message.content missing"));
    }

    if let Some(content) = reply.get("content") {
        return match content {
            Value::String(s) => Ok(s.clone()),
            Value::Array(blocks) => Ok(blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")),
            other => Ok(other.to_string()),
        };
    }

    if let Some(text) = reply.get("text") {
        return Ok(text.as_str().map(str::to_string).unwrap_or_else(|| text.to_string()));
    }

    Ok(reply.to_string())
}
