// Backend selection policy
use common::Settings;

use super::BackendKind;

/// `--ai-provider` choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    /// Hosted OpenAI-compatible API (needs an API key)
    #[value(alias = "openai")]
    Hosted,
    /// Local Ollama server
    #[value(alias = "ollama")]
    Local,
    /// Hosted first, then local, then basic
    Auto,
    /// Basic text extraction only
    None,
}

/// Everything the selection depends on, gathered before deciding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionInputs {
    pub use_ai: bool,
    pub provider: Provider,
    pub custom_url: bool,
    pub hosted_available: bool,
    pub local_available: bool,
}

/// Outcome of the selection table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// AI turned off
    Disabled,
    Hosted,
    LocalServer,
    CustomEndpoint,
    AutoHosted,
    AutoLocal,
    /// AI wanted but the requested service is not available
    Unavailable(Provider),
}

impl Selection {
    pub fn backend_kind(&self) -> BackendKind {
        match self {
            Selection::Hosted | Selection::AutoHosted => BackendKind::Hosted,
            Selection::LocalServer | Selection::AutoLocal => BackendKind::LocalServer,
            Selection::CustomEndpoint => BackendKind::CustomEndpoint,
            Selection::Disabled | Selection::Unavailable(_) => BackendKind::Basic,
        }
    }

    /// User-facing warning for the fallback cases
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Selection::Unavailable(Provider::Auto) => {
                Some("No AI services available. Using basic summarization.")
            }
            Selection::Unavailable(_) => Some("Requested AI service not available. Using basic summarization."),
            _ => None,
        }
    }
}

/// Pure decision table for which backend summarizes this run.
pub fn select(inputs: SelectionInputs) -> Selection {
    if !inputs.use_ai || inputs.provider == Provider::None {
        return Selection::Disabled;
    }
    if inputs.custom_url {
        return Selection::CustomEndpoint;
    }

    match inputs.provider {
        Provider::Local if inputs.local_available => Selection::LocalServer,
        Provider::Hosted if inputs.hosted_available => Selection::Hosted,
        Provider::Auto if inputs.hosted_available => Selection::AutoHosted,
        Provider::Auto if inputs.local_available => Selection::AutoLocal,
        requested => Selection::Unavailable(requested),
    }
}

/// Whether deciding needs to know if the local server is up.
pub fn needs_local_probe(use_ai: bool, provider: Provider, custom_url: bool, hosted_available: bool) -> bool {
    use_ai
        && !custom_url
        && match provider {
            Provider::Local => true,
            Provider::Auto => !hosted_available,
            Provider::Hosted | Provider::None => false,
        }
}

/// Configuration warnings printed before a run starts.
pub fn startup_warnings(provider: Provider, settings: &Settings) -> Vec<String> {
    let mut warnings = Vec::new();
    if matches!(provider, Provider::Hosted | Provider::Auto) && settings.hosted.api_key.is_none() {
        warnings.push(format!("{} environment variable not set.", settings.hosted.api_key_env));
    }
    if !warnings.is_empty() && provider != Provider::Auto {
        warnings.push("Consider using --ai-provider auto or --no-ai".to_string());
    }
    warnings
}
