use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

pub mod custom;
pub mod ollama;
pub mod remote;
pub mod selector;
pub mod summarizer;

pub use custom::CustomEndpointBackend;
pub use ollama::LocalServerBackend;
pub use remote::HostedBackend;
pub use summarizer::BasicBackend;

/// Core trait for summarization backends (AI or local)
#[async_trait::async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Which backend this is, for logging and the report
    fn kind(&self) -> BackendKind;

    /// Turn aggregated log text into bullet points
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError>;
}

/// One summarization job, built once per run
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub content: String,
    /// Hard cap for the basic backend, a request for AI backends
    pub bullet_count: usize,
    /// Keep `<think>` regions in AI output
    pub preserve_thinking: bool,
}

impl SummaryRequest {
    pub fn new(content: impl Into<String>, bullet_count: usize, preserve_thinking: bool) -> anyhow::Result<Self> {
        if bullet_count < 1 {
            anyhow::bail!("Number of bullets must be at least 1");
        }
        Ok(Self {
            content: content.into(),
            bullet_count,
            preserve_thinking,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Hosted,
    LocalServer,
    CustomEndpoint,
    Basic,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Hosted => "Hosted API",
            BackendKind::LocalServer => "Ollama",
            BackendKind::CustomEndpoint => "Custom API",
            BackendKind::Basic => "Basic",
        };
        f.write_str(name)
    }
}

/// Failure of an AI backend. The caller falls back to [`BasicBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{backend} authentication failed: {message}")]
    Auth { backend: BackendKind, message: String },

    #[error("{backend} request failed: {source}")]
    Transport {
        backend: BackendKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} request timed out after {secs}s")]
    Timeout { backend: BackendKind, secs: u64 },

    #[error("{backend} API error {status}: {body}")]
    Status {
        backend: BackendKind,
        status: u16,
        body: String,
    },

    #[error("{backend} returned a malformed response: {message}")]
    Format { backend: BackendKind, message: String },
}

impl BackendError {
    pub fn backend(&self) -> BackendKind {
        match self {
            BackendError::Auth { backend, .. }
            | BackendError::Transport { backend, .. }
            | BackendError::Timeout { backend, .. }
            | BackendError::Status { backend, .. }
            | BackendError::Format { backend, .. } => *backend,
        }
    }

    fn format(backend: BackendKind, message: impl Into<String>) -> Self {
        BackendError::Format {
            backend,
            message: message.into(),
        }
    }
}

/// The backend chosen for a run
pub enum Backend {
    Hosted(HostedBackend),
    LocalServer(LocalServerBackend),
    CustomEndpoint(CustomEndpointBackend),
    Basic(BasicBackend),
}

#[async_trait::async_trait]
impl SummaryBackend for Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Hosted(b) => b.kind(),
            Backend::LocalServer(b) => b.kind(),
            Backend::CustomEndpoint(b) => b.kind(),
            Backend::Basic(b) => b.kind(),
        }
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError> {
        match self {
            Backend::Hosted(b) => b.summarize(request).await,
            Backend::LocalServer(b) => b.summarize(request).await,
            Backend::CustomEndpoint(b) => b.summarize(request).await,
            Backend::Basic(b) => b.summarize(request).await,
        }
    }
}

pub(crate) const SYSTEM_PROMPT: &str = "You are a helpful assistant that creates concise summaries.";

/// User prompt shared by every AI backend
pub(crate) fn build_prompt(content: &str, bullet_count: usize) -> String {
    format!(
        r#"Summarize the following log content into exactly {n} bullet points.
Focus on the most important information, tasks, and key insights.

Content:
{content}

Provide exactly {n} bullet points, formatted as:
• Point 1
• Point 2
etc."#,
        n = bullet_count,
        content = content
    )
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

pub(crate) fn chat_messages(request: &SummaryRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: build_prompt(&request.content, request.bullet_count),
        },
    ]
}

fn think_regex() -> &'static Regex {
    static THINK: OnceLock<Regex> = OnceLock::new();
    THINK.get_or_init(|| Regex::new(r"(?is)<think>.*?</think>").expect("static regex"))
}

/// Remove `<think>...</think>` regions (any case, across lines) unless asked to keep them.
/// The result is always trimmed.
pub fn strip_thinking(text: &str, preserve_thinking: bool) -> String {
    if preserve_thinking {
        return text.trim().to_string();
    }
    think_regex().replace_all(text, "").trim().to_string()
}

/// POST a JSON body and decode a JSON reply, mapping failures onto [`BackendError`].
pub(crate) async fn post_json<B, R>(
    client: &reqwest::Client,
    backend: BackendKind,
    url: &str,
    bearer: Option<&str>,
    body: &B,
    timeout: Duration,
) -> Result<R, BackendError>
where
    B: Serialize + ?Sized,
    R: serde::de::DeserializeOwned,
{
    let mut builder = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(body);
    if let Some(key) = bearer {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }

    let timed_out = || BackendError::Timeout {
        backend,
        secs: timeout.as_secs(),
    };
    let transport = |source: reqwest::Error| {
        if source.is_timeout() {
            timed_out()
        } else {
            BackendError::Transport { backend, source }
        }
    };

    // One deadline covers connecting, the headers and the whole body
    let exchange = async {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok::<_, reqwest::Error>((status, text))
    };
    let (status, text) = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| timed_out())?
        .map_err(transport)?;

    if !status.is_success() {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth {
                backend,
                message: format!("{}: {}", status, text),
            });
        }
        return Err(BackendError::Status {
            backend,
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| BackendError::format(backend, format!("{} (body: {})", e, text)))
}
