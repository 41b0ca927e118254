//! Judge configuration: which model backend to use, where audit files go,
//! and the policy text handed to the checklist generator.

use serde::{Deserialize, Serialize};
use ollama_rs::Ollama;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

use crate::agent::{
    GeminiProvider, LLMProvider, OllamaProvider, OpenAICompatibleProvider, RetryPolicy,
    RetryingProvider,
};
use crate::error::{JudgeError, JudgeResult};
use crate::mission::DEFAULT_POLICY;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CONFIG_FILE: &str = "mission_judge.json";
pub const DEFAULT_OUTPUT_DIR: &str = "mission_output";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_DEFAULT_PORT: u16 = 11434;

/// Secondary variable checked when the configured key variable is unset.
pub const FALLBACK_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[serde(alias = "openai_compatible")]
    Openai,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" | "openai_compatible" => Ok(ProviderKind::Openai),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(JudgeError::Config(format!("unknown provider '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub provider: ProviderKind,
    pub model: String,
    /// Override for the backend endpoint (OpenAI-compatible servers, proxies).
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Where the three audit JSON files go; `None` disables them.
    pub output_dir: Option<PathBuf>,
    pub policy: String,
    pub request_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key_env: "GOOGLE_API_KEY".to_string(),
            output_dir: Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
            policy: DEFAULT_POLICY.to_string(),
            request_timeout_secs: 120,
            retry: RetryPolicy::default(),
        }
    }
}

impl JudgeConfig {
    /// Apply `MISSION_JUDGE_*` overrides from the given variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> JudgeResult<()> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("MISSION_JUDGE_PROVIDER") {
            self.provider = provider.parse()?;
        }
        if let Some(model) = get("MISSION_JUDGE_MODEL") {
            self.model = model;
        }
        if let Some(url) = get("MISSION_JUDGE_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(dir) = get("MISSION_JUDGE_OUTPUT_DIR") {
            self.output_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) -> JudgeResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Resolve the API key, trying the configured variable first.
    pub fn api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        [self.api_key_env.as_str(), FALLBACK_KEY_ENV]
            .into_iter()
            .filter_map(|name| lookup(name))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Build the configured backend wrapped in the retry policy.
    pub fn build_provider(&self, api_key: Option<String>) -> JudgeResult<Arc<dyn LLMProvider>> {
        let inner: Arc<dyn LLMProvider> = match self.provider {
            ProviderKind::Gemini => {
                let key = api_key.ok_or_else(|| {
                    JudgeError::Config(format!(
                        "{} (or {}) is required for the Gemini backend",
                        self.api_key_env, FALLBACK_KEY_ENV
                    ))
                })?;
                Arc::new(GeminiProvider::new(self.base_url.clone(), key, self.request_timeout())?)
            }
            ProviderKind::Openai => Arc::new(OpenAICompatibleProvider::new(
                self.base_url.clone().unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                api_key,
                self.request_timeout(),
            )?),
            ProviderKind::Ollama => Arc::new(OllamaProvider::new(ollama_client(self.base_url.as_deref())?)),
        };
        Ok(Arc::new(RetryingProvider::new(inner, self.retry)))
    }
}

/// Ollama client for `base_url`, or the default local endpoint.
fn ollama_client(base_url: Option<&str>) -> JudgeResult<Ollama> {
    let Some(raw) = base_url else {
        return Ok(Ollama::default());
    };
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|e| JudgeError::Config(format!("invalid Ollama base_url '{}': {}", raw, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| JudgeError::Config(format!("Ollama base_url '{}' has no host", raw)))?;
    let port = url.port_or_known_default().unwrap_or(OLLAMA_DEFAULT_PORT);
    Ok(Ollama::new(format!("{}://{}", url.scheme(), host), port))
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the config, writing the defaults first if the file does not exist.
    pub async fn load(&self) -> JudgeResult<JudgeConfig> {
        if !self.path.exists() {
            let default = JudgeConfig::default();
            self.save(&default).await?;
            return Ok(default);
        }
        let content = fs::read_to_string(&self.path).await?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self, config: &JudgeConfig) -> JudgeResult<()> {
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}
