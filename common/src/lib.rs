/*!
common/src/lib.rs

Shared configuration types and runtime settings for logdigest.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges an optional default file with an optional override file
- `Settings`, the explicit runtime value threaded through the summarizer, resolved once
  at startup (API keys are read from the environment here and nowhere else)
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOSTED_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_HOSTED_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_HOSTED_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_CUSTOM_KEY_ENV: &str = "CUSTOM_API_KEY";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
/// About a century; keeps `now - window` representable
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Hosted (OpenAI-compatible) backend section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostedConfig {
    pub api_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// Local model server (Ollama) section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalConfig {
    pub host: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// How long the reachability probe waits before declaring the server absent
    pub probe_timeout_seconds: Option<u64>,
}

/// User-supplied endpoint section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// Summary defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Width of the default "recent files" window, in days
    pub window_days: Option<i64>,
}

/// Top-level application configuration (deserialized from logdigest.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hosted: HostedConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub custom: CustomConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// With neither present the built-in defaults apply.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for (label, path) in [("default", default_path), ("override", override_path)] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {} config: {}", label, path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse {} configuration", label))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[derive(Debug, Clone)]
pub struct HostedSettings {
    pub api_url: String,
    pub api_key_env: String,
    /// `None` when the key variable is unset or empty; the hosted backend is then unavailable
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: usize,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct LocalSettings {
    pub host: String,
    pub model: String,
    pub timeout: Duration,
    pub probe_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CustomSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Fully resolved runtime settings. Built once at startup and passed by value.
#[derive(Debug, Clone)]
pub struct Settings {
    pub hosted: HostedSettings,
    pub local: LocalSettings,
    pub custom: CustomSettings,
    pub window_days: i64,
}

impl Settings {
    /// Resolve settings against the process environment.
    pub fn from_env(config: &Config) -> Result<Self> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve settings with an explicit variable lookup.
    pub fn resolve<F>(config: &Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let hosted_key_env = config
            .hosted
            .api_key_env
            .clone()
            .unwrap_or_else(|| DEFAULT_HOSTED_KEY_ENV.to_string());
        let hosted = HostedSettings {
            api_url: config
                .hosted
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_HOSTED_API_URL.to_string()),
            api_key: read(&hosted_key_env),
            api_key_env: hosted_key_env,
            model: config
                .hosted
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_HOSTED_MODEL.to_string()),
            timeout: Duration::from_secs(config.hosted.timeout_seconds.unwrap_or(60)),
            max_tokens: config.hosted.max_tokens.unwrap_or(500),
            temperature: config.hosted.temperature.unwrap_or(0.3),
        };

        let host = config
            .local
            .host
            .clone()
            .or_else(|| read(OLLAMA_HOST_ENV))
            .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
        let local = LocalSettings {
            host: normalize_host(&host),
            model: config
                .local
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            timeout: Duration::from_secs(config.local.timeout_seconds.unwrap_or(120)),
            probe_timeout: Duration::from_secs(config.local.probe_timeout_seconds.unwrap_or(2)),
        };

        let custom_key_env = config
            .custom
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_CUSTOM_KEY_ENV);
        let custom_url = match config.custom.api_url.as_deref() {
            Some(raw) => Some(validate_endpoint(raw)?),
            None => None,
        };
        let custom = CustomSettings {
            api_url: custom_url,
            api_key: read(custom_key_env),
            timeout: Duration::from_secs(config.custom.timeout_seconds.unwrap_or(30)),
            max_tokens: config.custom.max_tokens.unwrap_or(500),
            temperature: config.custom.temperature.unwrap_or(0.3),
        };

        let window_days = config.summary.window_days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
            anyhow::bail!(
                "summary.window_days must be between 1 and {} (got {})",
                MAX_WINDOW_DAYS,
                window_days
            );
        }

        Ok(Settings {
            hosted,
            local,
            custom,
            window_days,
        })
    }
}

/// Check that `raw` is an absolute http(s) URL and return it unchanged.
pub fn validate_endpoint(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw).with_context(|| format!("Invalid endpoint URL: {}", raw))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        other => anyhow::bail!("Unsupported URL scheme '{}' in {}", other, raw),
    }
}

// OLLAMA_HOST is commonly set as bare "host:port"
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_config_or_env() {
        let settings = Settings::resolve(&Config::default(), lookup(&[])).expect("resolve");
        assert_eq!(settings.hosted.api_url, DEFAULT_HOSTED_API_URL);
        assert_eq!(settings.hosted.model, DEFAULT_HOSTED_MODEL);
        assert!(settings.hosted.api_key.is_none());
        assert_eq!(settings.local.host, DEFAULT_OLLAMA_HOST);
        assert_eq!(settings.local.model, DEFAULT_OLLAMA_MODEL);
        assert_eq!(settings.custom.timeout, Duration::from_secs(30));
        assert!(settings.custom.api_url.is_none());
        assert_eq!(settings.window_days, 7);
    }

    #[test]
    fn keys_come_from_named_variables() {
        let toml = r#"
            [hosted]
            api_key_env = "MY_HOSTED_KEY"
            model = "gpt-4.1-mini"
        "#;
        let cfg: Config = toml::from_str(toml).expect("parse config");
        let settings = Settings::resolve(
            &cfg,
            lookup(&[("MY_HOSTED_KEY", "sk-test"), ("CUSTOM_API_KEY", "custom-key")]),
        )
        .expect("resolve");

        assert_eq!(settings.hosted.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.hosted.model, "gpt-4.1-mini");
        assert_eq!(settings.custom.api_key.as_deref(), Some("custom-key"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let settings =
            Settings::resolve(&Config::default(), lookup(&[("OPENAI_API_KEY", "  ")])).expect("resolve");
        assert!(settings.hosted.api_key.is_none());
    }

    #[test]
    fn bare_ollama_host_gets_scheme() {
        let settings =
            Settings::resolve(&Config::default(), lookup(&[("OLLAMA_HOST", "10.0.0.5:11434/")])).expect("resolve");
        assert_eq!(settings.local.host, "http://10.0.0.5:11434");
    }

    #[test]
    fn rejects_bad_custom_url_and_window() {
        let cfg: Config = toml::from_str("[custom]\napi_url = \"ftp://example.com\"").expect("parse");
        assert!(Settings::resolve(&cfg, lookup(&[])).is_err());

        let cfg: Config = toml::from_str("[summary]\nwindow_days = 0").expect("parse");
        assert!(Settings::resolve(&cfg, lookup(&[])).is_err());
    }

    #[test]
    fn window_days_has_an_upper_bound() {
        let cfg: Config = toml::from_str("[summary]\nwindow_days = 200000000").expect("parse");
        let err = Settings::resolve(&cfg, lookup(&[])).expect_err("too wide");
        assert!(err.to_string().contains("between 1 and 36500"));

        let cfg: Config = toml::from_str("[summary]\nwindow_days = 36500").expect("parse");
        assert_eq!(Settings::resolve(&cfg, lookup(&[])).expect("settings").window_days, 36500);
    }

    #[tokio::test]
    async fn override_file_wins_over_default_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("default.toml");
        let override_path = dir.path().join("logdigest.toml");
        std::fs::write(
            &default_path,
            "[local]\nmodel = \"llama3.2\"\nhost = \"http://box:11434\"\n",
        )
        .expect("write default");
        std::fs::write(&override_path, "[local]\nmodel = \"qwen3\"\n").expect("write override");

        let cfg = Config::load_with_defaults(Some(&default_path), Some(&override_path))
            .await
            .expect("load");
        assert_eq!(cfg.local.model.as_deref(), Some("qwen3"));
        assert_eq!(cfg.local.host.as_deref(), Some("http://box:11434"));

        let only_override = Config::load_with_defaults(None, Some(&override_path))
            .await
            .expect("load");
        assert!(only_override.local.host.is_none());
    }

    #[tokio::test]
    async fn missing_files_yield_defaults() {
        let cfg = Config::load_with_defaults(None, Some(Path::new("/nonexistent/logdigest.toml")))
            .await
            .expect("load");
        assert!(cfg.hosted.model.is_none());
    }
}
