use super::AppState;
use super::auth::bearer_token;
use super::errors::ApiError;
use crate::StashError;
use crate::openai::ChatMessage;
use crate::snippets::{CreateSnippetRequest, DeleteSnippetRequest, UpdateSnippetRequest};
use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt, future};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Resolve the caller's owner id or reject the request.
async fn require_owner(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    state
        .auth
        .resolve(bearer_token(headers))
        .await?
        .ok_or(ApiError(StashError::Unauthorized))
}

pub async fn list_snippets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let owner = require_owner(&state, &headers).await?;
    let snippets = state.snippets.list(&owner).await?;
    Ok(Json(json!({ "snippets": snippets })))
}

pub async fn create_snippet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateSnippetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = require_owner(&state, &headers).await?;
    let snippet = state.snippets.create(&owner, &request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "snippet": snippet }))))
}

pub async fn update_snippet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<UpdateSnippetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = require_owner(&state, &headers).await?;
    let snippet = state.snippets.update(&owner, &request).await?;
    Ok(Json(json!({ "snippet": snippet })))
}

pub async fn delete_snippet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<DeleteSnippetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = require_owner(&state, &headers).await?;
    state.snippets.delete(&owner, &request).await?;
    Ok(Json(json!({ "message": "Snippet has been deleted" })))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let owner = require_owner(&state, &headers).await?;
    let stream = state.chat.respond(&owner, request.messages).await?;

    let body = Body::from_stream(error_terminated(stream));
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response())
}

/// Visible error sentinel appended when a stream fails after headers are sent.
const STREAM_ERROR_CHUNK: &str = "\n[error] response interrupted";

/// Convert a fallible text stream into a byte stream that ends after the
/// first failure.
///
/// The 200 status is already on the wire when a mid-stream error happens,
/// so the failure is surfaced in-band as one final chunk.
fn error_terminated<S>(stream: S) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static
where
    S: Stream<Item = crate::Result<String>> + Send + 'static,
{
    stream.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }

        future::ready(Some(Ok(match item {
            Ok(chunk) => Bytes::from(chunk),
            Err(e) => {
                error!("Chat stream failed mid-response: {}", e);
                *failed = true;
                Bytes::from_static(STREAM_ERROR_CHUNK.as_bytes())
            }
        })))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StashError;

    #[tokio::test]
    async fn error_terminated_passes_chunks_through() {
        let chunks: Vec<crate::Result<String>> =
            vec![Ok("Hello".to_string()), Ok(" world".to_string())];
        let collected: Vec<Bytes> = error_terminated(futures::stream::iter(chunks))
            .map(|item| item.expect("stream is infallible"))
            .collect()
            .await;

        assert_eq!(collected, vec![Bytes::from("Hello"), Bytes::from(" world")]);
    }

    #[tokio::test]
    async fn error_terminated_emits_sentinel_and_stops() {
        let chunks: Vec<crate::Result<String>> = vec![
            Ok("partial".to_string()),
            Err(StashError::Upstream("connection reset".to_string())),
            Ok("never delivered".to_string()),
        ];
        let collected: Vec<Bytes> = error_terminated(futures::stream::iter(chunks))
            .map(|item| item.expect("stream is infallible"))
            .collect()
            .await;

        assert_eq!(
            collected,
            vec![Bytes::from("partial"), Bytes::from(STREAM_ERROR_CHUNK)]
        );
    }
}
