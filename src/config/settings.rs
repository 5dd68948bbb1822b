use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Base directory for the snippet database and the vector index.
    /// Defaults to the config directory itself.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    pub base_url: String,
    /// Falls back to the OPENAI_API_KEY environment variable when unset.
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub embedding_dimension: usize,
}

/// Static bearer-token identity mapping: token -> owner id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid embedding dimension: {0} (must be between 1 and 8192)")]
    InvalidDimension(usize),
    #[error("OpenAI API key not set (set openai.api_key or the OPENAI_API_KEY environment variable)")]
    MissingApiKey,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

fn default_base_dir() -> PathBuf {
    Config::config_dir().unwrap_or_else(|_| PathBuf::from("."))
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            server: ServerConfig::default(),
            openai: OpenAiConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4820,
        }
    }
}

impl Default for OpenAiConfig {
    #[inline]
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/".to_string(),
            api_key: None,
            embedding_model: "text-embedding-ada-002".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_dimension: 1536,
        }
    }
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".codestash"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("codestash"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    #[inline]
    pub fn load() -> Result<Self> {
        let config_path =
            Self::config_file_path().context("Failed to determine config file path")?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort(self.server.port));
        }
        self.openai.validate()
    }

    /// Path of the SQLite snippet database.
    #[inline]
    pub fn sqlite_path(&self) -> PathBuf {
        self.base_dir.join("snippets.db")
    }

    /// Directory of the LanceDB vector index.
    #[inline]
    pub fn vector_db_path(&self) -> PathBuf {
        self.base_dir.join("vectors")
    }
}

impl OpenAiConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }

        if self.embedding_dimension == 0 || self.embedding_dimension > 8192 {
            return Err(ConfigError::InvalidDimension(self.embedding_dimension));
        }

        Ok(())
    }

    /// Resolve the API key from the config file or the environment.
    #[inline]
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or(ConfigError::MissingApiKey)
    }
}
