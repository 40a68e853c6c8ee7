use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`LlamaConfig::api_url`].
pub const ENV_API_URL: &str = "LLAMA_API_URL";
/// Environment variable overriding [`LlamaConfig::api_key`].
pub const ENV_API_KEY: &str = "LLAMA_API_KEY";
/// Environment variable overriding [`LlamaConfig::model`].
pub const ENV_MODEL: &str = "LLAMA_MODEL";

/// Top-level configuration for llama-feed.
///
/// Nothing that identifies the backend is compiled in except defaults for the
/// endpoint and model; the API key always comes from the config file or
/// `LLAMA_API_KEY`.
///
/// # Loading
///
/// ```rust,no_run
/// use llama_feed::config::Config;
///
/// // From a JSON file, then LLAMA_* environment overrides
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.llama.api_key = "LLM|...".into();
/// config.search.analysis_delay_ms = 250;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat-completion backend settings.
    pub llama: LlamaConfig,
    /// Semantic search settings.
    pub search: SearchConfig,
}

/// Chat-completion endpoint configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlamaConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Per-request timeout in seconds. Requests are never retried.
    pub timeout_secs: u64,
}

/// Controls the search pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Pause between successive per-post image analyses, in milliseconds.
    pub analysis_delay_ms: u64,
    /// Question asked about every post image during enrichment.
    pub description_prompt: String,
    /// How many posts the recently-viewed list shows.
    pub recently_viewed_count: usize,
}

impl Default for LlamaConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            model: "Llama-4-Maverick-17B-128E-Instruct-FP8".to_string(),
            timeout_secs: 20,
        }
    }
}

impl LlamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keeps the key out of logs.
impl fmt::Debug for LlamaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("LlamaConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &key)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            analysis_delay_ms: 500,
            description_prompt: "Describe this image in detail, including objects, people, colors, setting, and any notable features.".to_string(),
            recently_viewed_count: 3,
        }
    }
}

impl SearchConfig {
    pub fn analysis_delay(&self) -> Duration {
        Duration::from_millis(self.analysis_delay_ms)
    }
}

impl Config {
    /// Resolve the config file path: `config.json` next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location, then
    /// apply `LLAMA_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        if config.llama.api_url.is_empty() {
            log::warn!(
                "No Llama API URL configured (set {ENV_API_URL}); \
                 responses will come from the mock responder"
            );
        }
        if config.llama.api_key.is_empty() {
            log::warn!(
                "No Llama API key configured (set {ENV_API_KEY}); \
                 responses will come from the mock responder"
            );
        }
        Ok(config)
    }

    fn load_file(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Override endpoint, key and model from the given variable lookup.
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.llama.api_url = url;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.llama.api_key = key;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.llama.model = model;
        }
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
