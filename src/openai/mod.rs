// OpenAI provider module
// One shared client for the embeddings endpoint and the streaming chat endpoint


pub mod chat;
pub mod embeddings;

pub use chat::{ChatMessage, Role};

use crate::config::OpenAiConfig;
use crate::{Result, StashError};
use std::time::Duration;
use url::Url;

const CONNECT_TIMEOUT_SECONDS: u64 = 10;

/// Client for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    embedding_model: String,
    chat_model: String,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .map_err(|e| StashError::Config(e.to_string()))?;

        // A trailing slash keeps Url::join from clobbering the base path.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|_| StashError::Config(format!("Invalid OpenAI base URL: {}", base)))?;

        // No global timeout: chat completions stream for longer than any
        // sensible per-request cap.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| StashError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_key,
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| StashError::Config(format!("Invalid OpenAI endpoint {}: {}", path, e)))
    }
}
