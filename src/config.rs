//! Layered configuration: TOML file over built-in defaults.
//!
//! Every field has a default, so a missing config file is not an error and a
//! partial file only overrides what it names. Paths default under the
//! platform data directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub system: SystemConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    /// SQLite candidate database.
    pub database_path: PathBuf,
    /// Directory holding persisted index artifacts.
    pub index_dir: PathBuf,
    /// Default directory scanned by `ingest`.
    pub data_dir: PathBuf,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("matchpoint");
        Self {
            database_path: base.join("candidates.db"),
            index_dir: base.join("index"),
            data_dir: base.join("data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions base URL.
    pub api_base: String,
    /// Model used for profile extraction at ingest time.
    pub extraction_model: String,
    /// Model used for candidate scoring at query time.
    pub reasoning_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            extraction_model: "llama-3.1-8b-instant".to_string(),
            reasoning_model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Fused hits returned per query.
    pub top_k_chunks: usize,
    /// RRF smoothing constant.
    pub rrf_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k_chunks: crate::search::fusion::DEFAULT_TOP_K,
            rrf_k: crate::search::fusion::DEFAULT_RRF_K,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Default config file location (`<config dir>/matchpoint/config.toml`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("matchpoint")
            .join("config.toml")
    }
}
