//! Service configuration.
//!
//! Settings come from an optional TOML file (default location under
//! the platform config dir) with API keys overlaid from environment
//! variables. Everything is read once at process start; no core
//! component depends on live reload.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable names holding provider API keys. These always
/// win over keys in the config file so secrets can stay out of it.
const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
const COHERE_KEY_VAR: &str = "COHERE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub providers: ProvidersConfig,
    pub tools: ToolsConfig,
}

// ── Sections ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8700,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted code sample, in bytes.
    pub max_code_bytes: usize,
    /// Maximum requests in one batch call.
    pub max_batch: usize,
    /// Per-tool external process timeout, in seconds.
    pub tool_timeout_secs: u64,
    /// Per-provider HTTP call timeout, in seconds.
    pub provider_timeout_secs: u64,
    /// Concurrent sample pipelines during a batch review.
    pub batch_workers: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_code_bytes: 10 * 1024 * 1024,
            max_batch: 50,
            tool_timeout_secs: 30,
            provider_timeout_secs: 60,
            batch_workers: 4,
        }
    }
}

/// One AI provider's settings. The provider participates in the chain
/// only when an API key is present after the env overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: String::new(),
            max_tokens: 4000,
            temperature: 0.1,
        }
    }
}

impl ProviderConfig {
    fn with_model(model: &str) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Chain order; providers are tried strictly in this order.
    pub priority: Vec<String>,
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub cohere: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            priority: vec!["openai".into(), "anthropic".into(), "cohere".into()],
            openai: ProviderConfig::with_model("gpt-4"),
            anthropic: ProviderConfig::with_model("claude-sonnet-4-5"),
            cohere: ProviderConfig::with_model("command"),
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openai" => Some(&self.openai),
            "anthropic" => Some(&self.anthropic),
            "cohere" => Some(&self.cohere),
            _ => None,
        }
    }

    /// Names of providers that hold an API key, in priority order.
    pub fn configured_names(&self) -> Vec<String> {
        self.priority
            .iter()
            .filter(|name| self.get(name).is_some_and(ProviderConfig::is_configured))
            .cloned()
            .collect()
    }
}

/// Per-tool enable flags for the static runners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub pylint: bool,
    pub eslint: bool,
    pub bandit: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pylint: true,
            eslint: true,
            bandit: true,
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl Config {
    /// Default config file path under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "zeroclaw-labs", "critiq")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path` (or defaults when the file is absent), then
    /// overlay API keys from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = path.map(Path::to_path_buf).or_else(Self::default_path);

        let mut config = match resolved {
            Some(ref p) if p.exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config: {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config: {}", p.display()))?
            }
            _ => Self::default(),
        };

        config.overlay_env();
        Ok(config)
    }

    /// Pull API keys from environment variables, overriding the file.
    fn overlay_env(&mut self) {
        if let Ok(key) = std::env::var(OPENAI_KEY_VAR) {
            self.providers.openai.api_key = Some(key);
        }
        if let Ok(key) = std::env::var(ANTHROPIC_KEY_VAR) {
            self.providers.anthropic.api_key = Some(key);
        }
        if let Ok(key) = std::env::var(COHERE_KEY_VAR) {
            self.providers.cohere.api_key = Some(key);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
