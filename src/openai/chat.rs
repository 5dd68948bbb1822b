use super::OpenAiClient;
use crate::{Result, StashError};
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, future};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// End-of-stream sentinel sent by the completions endpoint.
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

impl OpenAiClient {
    /// Stream a chat completion as text chunks.
    ///
    /// The returned stream is lazy and not restartable; dropping it drops the
    /// underlying HTTP response, which cancels the upstream completion.
    #[inline]
    pub async fn stream_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<impl Stream<Item = Result<String>> + Send + use<>> {
        debug!("Requesting streamed completion for {} messages", messages.len());

        let url = self.endpoint("v1/chat/completions")?;
        let request = ChatCompletionRequest {
            model: &self.chat_model,
            messages: &messages,
            stream: true,
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| StashError::Upstream(format!("completion request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StashError::Upstream(format!(
                "completion request returned HTTP {}",
                response.status()
            )));
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                future::ready(!matches!(event, Ok(event) if event.data == DONE_SENTINEL))
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => parse_chunk(&event.data).transpose(),
                    Err(e) => Some(Err(StashError::Upstream(format!(
                        "completion stream failed: {}",
                        e
                    )))),
                })
            });

        Ok(stream)
    }
}

/// Extract the delta text from one SSE data payload. Chunks without content
/// (role preludes, finish markers) yield `None`.
fn parse_chunk(data: &str) -> Result<Option<String>> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)
        .map_err(|e| StashError::Upstream(format!("malformed completion chunk: {}", e)))?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content))
}
