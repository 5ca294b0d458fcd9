//! Inference configuration.
//!
//! Process-wide model configuration with explicit init at startup and no
//! runtime mutation: the loaded [`InferenceConfig`] is passed to each
//! backend's constructor rather than living in ambient global state.
//!
//! Configuration can be loaded from:
//! - A TOML file (path from `PAPERFLOW_INFERENCE_CONFIG`)
//! - Environment variables (`PAPERFLOW_*` / `OLLAMA_BASE`)

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use paperflow_core::defaults;

use crate::retry::RetryPolicy;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Ollama backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model used for classification and field extraction.
    pub generation_model: String,
    /// Model used for embeddings.
    pub embedding_model: String,
    /// Vision model used for OCR transcription.
    pub ocr_model: String,
    /// Expected embedding vector dimension.
    pub embedding_dimension: usize,
    /// Timeout for generation requests (seconds).
    pub gen_timeout_secs: u64,
    /// Timeout for embedding requests (seconds).
    pub embed_timeout_secs: u64,
    /// Timeout for OCR requests (seconds).
    pub ocr_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OLLAMA_URL.to_string(),
            generation_model: defaults::GEN_MODEL.to_string(),
            embedding_model: defaults::EMBED_MODEL.to_string(),
            ocr_model: defaults::OCR_MODEL.to_string(),
            embedding_dimension: defaults::EMBED_DIMENSION,
            gen_timeout_secs: defaults::GEN_TIMEOUT_SECS,
            embed_timeout_secs: defaults::EMBED_TIMEOUT_SECS,
            ocr_timeout_secs: defaults::OCR_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.generation_model.is_empty() {
            return Err(ConfigError::Validation(
                "generation_model cannot be empty".to_string(),
            ));
        }
        if self.embedding_model.is_empty() {
            return Err(ConfigError::Validation(
                "embedding_model cannot be empty".to_string(),
            ));
        }
        if self.embedding_dimension == 0 {
            return Err(ConfigError::Validation(
                "embedding_dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Retry schedule settings (serializable form of [`RetryPolicy`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: defaults::LLM_MAX_ATTEMPTS,
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Top-level inference configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub ollama: OllamaConfig,
    pub retry: RetrySettings,
}

impl InferenceConfig {
    /// Load from the file named by `PAPERFLOW_INFERENCE_CONFIG`, falling
    /// back to environment variables.
    pub fn load() -> ConfigResult<Self> {
        if let Ok(path) = env::var(defaults::ENV_INFERENCE_CONFIG) {
            return Self::from_file(Path::new(&path));
        }
        Ok(Self::from_env())
    }

    /// Load and validate from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.ollama.validate()?;
        info!(path = %path.display(), "Loaded inference config from file");
        Ok(config)
    }

    /// Build from environment variables over defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var(defaults::ENV_OLLAMA_BASE) {
            config.ollama.base_url = url;
        }
        if let Ok(model) = env::var(defaults::ENV_GEN_MODEL) {
            config.ollama.generation_model = model;
        }
        if let Ok(model) = env::var(defaults::ENV_EMBED_MODEL) {
            config.ollama.embedding_model = model;
        }
        if let Ok(model) = env::var(defaults::ENV_OCR_MODEL) {
            config.ollama.ocr_model = model;
        }
        if let Some(dim) = env::var(defaults::ENV_EMBED_DIM)
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.ollama.embedding_dimension = dim;
        }
        config
    }
}
