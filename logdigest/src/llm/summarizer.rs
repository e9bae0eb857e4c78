// Summarizer module
use tracing::{info, warn};

use super::{BackendError, BackendKind, SummaryBackend, SummaryRequest};

pub const BULLET: &str = "•";
pub const NO_CONTENT_BULLET: &str = "• No meaningful content found.";

/// Lines must be longer than this (after trimming) to be sampled
const MIN_LINE_CHARS: usize = 10;
const MAX_LINE_CHARS: usize = 100;

/// Text produced for the report, tagged with the backend that wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub backend: BackendKind,
}

/// Summarize with `backend`, falling back to the basic summary once if it fails.
pub async fn summarize_with_fallback<B: SummaryBackend + ?Sized>(backend: &B, request: &SummaryRequest) -> Summary {
    match backend.summarize(request).await {
        Ok(text) => {
            info!(backend = %backend.kind(), chars = text.len(), "summarization successful");
            Summary {
                text,
                backend: backend.kind(),
            }
        }
        Err(e) => {
            warn!("AI summarization failed ({}). Using basic summarization.", e);
            Summary {
                text: basic_summary(&request.content, request.bullet_count),
                backend: BackendKind::Basic,
            }
        }
    }
}

/// Offline summarizer: evenly samples meaningful lines. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicBackend;

#[async_trait::async_trait]
impl SummaryBackend for BasicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Basic
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError> {
        Ok(basic_summary(&request.content, request.bullet_count))
    }
}

/// Pick up to `bullet_count` lines longer than 10 characters, evenly spaced,
/// and render them as bullets in their original order.
pub fn basic_summary(content: &str, bullet_count: usize) -> String {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_LINE_CHARS)
        .collect();

    if lines.is_empty() {
        return NO_CONTENT_BULLET.to_string();
    }

    sample_indices(lines.len(), bullet_count)
        .into_iter()
        .map(|i| format!("{} {}", BULLET, truncate(lines[i], MAX_LINE_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indices `floor(i * total / count)` for `i in 0..count`, or every index when
/// there are no more lines than bullets.
fn sample_indices(total: usize, count: usize) -> Vec<usize> {
    if total <= count {
        return (0..total).collect();
    }
    let step = total as f64 / count as f64;
    (0..count).map(|i| (i as f64 * step) as usize).collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", kept)
    }
}
