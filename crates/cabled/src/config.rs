//! Configuration management for cabled.
//!
//! Loads settings from /etc/cabled/config.toml (or an explicit path) and
//! falls back to defaults. A handful of environment variables override the
//! file so secrets never have to live in it.

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use cable_common::{ConfidenceBands, InputLimits, DEFAULT_MAX_FREE_TEXT_CHARS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/cabled/config.toml";

/// Fallback config file path
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/cabled/config.toml";

/// Which wire protocol the reasoning engine speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineBackend {
    /// Google Gemini generateContent
    Gemini,
    /// OpenAI-compatible chat/completions
    Openai,
    /// Local Ollama /api/generate
    Ollama,
}

impl EngineBackend {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            EngineBackend::Gemini => "https://generativelanguage.googleapis.com",
            EngineBackend::Openai => "https://api.openai.com",
            EngineBackend::Ollama => "http://127.0.0.1:11434",
        }
    }
}

/// Reasoning engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_backend")]
    pub backend: EngineBackend,

    /// Base URL; the backend's public endpoint when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound for one engine call
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,

    /// Low temperature keeps verdicts consistent between runs
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_backend() -> EngineBackend {
    EngineBackend::Gemini
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_engine_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: None,
            model: default_model(),
            api_key: None,
            timeout_secs: default_engine_timeout(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl EngineConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.backend.default_endpoint())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Validation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Re-query the engine once after a timeout
    #[serde(default)]
    pub retry_on_timeout: bool,

    #[serde(default = "default_max_free_text_chars")]
    pub max_free_text_chars: usize,

    /// Fallback confidence per status when the engine declares none
    #[serde(default)]
    pub confidence_bands: ConfidenceBands,
}

fn default_max_free_text_chars() -> usize {
    DEFAULT_MAX_FREE_TEXT_CHARS
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            retry_on_timeout: false,
            max_free_text_chars: default_max_free_text_chars(),
            confidence_bands: ConfidenceBands::default(),
        }
    }
}

impl ValidationConfig {
    pub fn input_limits(&self) -> InputLimits {
        InputLimits {
            max_free_text_chars: self.max_free_text_chars,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Browser origins allowed to call the API
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Insert the sample designs when the store is empty
    #[serde(default = "default_seed_on_start")]
    pub seed_on_start: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/cabled/cable_designs.db")
}

fn default_seed_on_start() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            seed_on_start: default_seed_on_start(),
        }
    }
}

/// Complete cabled configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CabledConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl CabledConfig {
    /// Load from an explicit path, or from the standard locations, then
    /// apply environment overrides.
    ///
    /// An explicit path that cannot be read is an error. Without one, the
    /// first standard location that exists is used and a broken file there
    /// is an error too; only when none exists do defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from_path(p)?,
            None => Self::load_first_existing(&[
                Path::new(CONFIG_PATH),
                Path::new(DEFAULT_CONFIG_PATH),
            ])?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_first_existing(candidates: &[&Path]) -> Result<Self> {
        match candidates.iter().find(|p| p.exists()) {
            Some(path) => Self::load_from_path(path),
            None => {
                warn!("Config not found, using defaults");
                Ok(CabledConfig::default())
            }
        }
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `GEMINI_API_KEY`, `CABLED_ENGINE_ENDPOINT`, `CABLED_ENGINE_MODEL`,
    /// `CABLED_DB_PATH` and `CABLED_CORS_ORIGINS` (comma-separated).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            if self.engine.api_key.is_none() {
                self.engine.api_key = Some(key);
            }
        }
        if let Some(endpoint) = lookup("CABLED_ENGINE_ENDPOINT").filter(|e| !e.is_empty()) {
            self.engine.endpoint = Some(endpoint);
        }
        if let Some(model) = lookup("CABLED_ENGINE_MODEL").filter(|m| !m.is_empty()) {
            self.engine.model = model;
        }
        if let Some(path) = lookup("CABLED_DB_PATH").filter(|p| !p.is_empty()) {
            self.storage.db_path = PathBuf::from(path);
        }
        if let Some(origins) = lookup("CABLED_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.timeout_secs == 0 {
            bail!("engine.timeout_secs must be greater than zero");
        }
        if !self.validation.confidence_bands.is_valid() {
            bail!("validation.confidence_bands must lie in [0, 1]");
        }
        if self.validation.max_free_text_chars == 0 {
            bail!("validation.max_free_text_chars must be greater than zero");
        }
        for origin in &self.server.cors_origins {
            if origin == "*" {
                bail!("server.cors_origins cannot be a wildcard, list origins explicitly");
            }
            if HeaderValue::from_str(origin).is_err() {
                bail!("server.cors_origins contains an invalid origin {:?}", origin);
            }
        }
        Ok(())
    }
}
