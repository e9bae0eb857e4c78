// Local model server (Ollama) backend
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{chat_messages, post_json, strip_thinking, BackendError, BackendKind, ChatMessage, SummaryBackend, SummaryRequest};
use common::LocalSettings;

pub struct LocalServerBackend {
    host: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl LocalServerBackend {
    pub fn new(settings: &LocalSettings, client: reqwest::Client) -> Self {
        Self {
            host: settings.host.clone(),
            model: settings.model.clone(),
            timeout: settings.timeout,
            client,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host.trim_end_matches('/'))
    }
}

/// Whether an Ollama server answers at `host`. Any error or non-2xx reply means no.
pub async fn is_reachable(client: &reqwest::Client, host: &str, probe_timeout: Duration) -> bool {
    let url = format!("{}/api/tags", host.trim_end_matches('/'));
    let probe = client.get(&url).timeout(probe_timeout).send();

    match tokio::time::timeout(probe_timeout, probe).await {
        Ok(Ok(response)) if response.status().is_success() => true,
        Ok(Ok(response)) => {
            debug!(%url, status = %response.status(), "ollama probe rejected");
            false
        }
        Ok(Err(e)) => {
            debug!(%url, error = %e, "ollama probe failed");
            false
        }
        Err(_) => {
            debug!(%url, "ollama probe timed out");
            false
        }
    }
}

#[async_trait::async_trait]
impl SummaryBackend for LocalServerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalServer
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError> {
        let req_body = OllamaChatRequest {
            model: &self.model,
            messages: chat_messages(request),
            stream: false,
        };

        let resp_body: OllamaChatResponse = post_json(
            &self.client,
            BackendKind::LocalServer,
            &self.chat_url(),
            None,
            &req_body,
            self.timeout,
        )
        .await?;

        if let Some(error) = resp_body.error {
            return Err(BackendError::format(BackendKind::LocalServer, error));
        }

        let content = resp_body
            .message
            .map(|m| m.content)
            .ok_or_else(|| BackendError::format(BackendKind::LocalServer, "response has no message"))?;

        Ok(strip_thinking(&content, request.preserve_thinking))
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}
