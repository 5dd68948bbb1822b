// Chat service
// Grounds a conversation in the caller's snippets before streaming a reply

#[cfg(test)]
mod tests;

use crate::database::lancedb::VectorStore;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::Snippet;
use crate::openai::{ChatMessage, OpenAiClient};
use crate::{Result, StashError};
use futures::Stream;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of trailing transcript messages used as the retrieval query.
pub const HISTORY_WINDOW: usize = 6;

/// Number of nearest snippets retrieved for grounding.
pub const RETRIEVAL_TOP_K: usize = 1;

const SYSTEM_PROMPT_PREAMBLE: &str =
    "You are a helpful programming assistant that explains code.The relevant code snippets are:\n";

/// Build the retrieval query from the tail of a conversation.
///
/// Only the last [`HISTORY_WINDOW`] messages participate, so long
/// conversations stay focused on what the user is asking about now.
#[inline]
#[must_use]
pub fn history_query(transcript: &[ChatMessage]) -> String {
    let start = transcript.len().saturating_sub(HISTORY_WINDOW);
    transcript[start..]
        .iter()
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render retrieved snippets into the system prompt.
#[inline]
#[must_use]
pub fn build_system_prompt(snippets: &[Snippet]) -> String {
    let rendered = snippets
        .iter()
        .map(|snippet| {
            format!(
                "Title: {}\nContent:\n{}\nProgramming Language:\n{}",
                snippet.title, snippet.content, snippet.language
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{}{}", SYSTEM_PROMPT_PREAMBLE, rendered)
}

/// Snippet-grounded chat over the caller's vault.
#[derive(Clone)]
pub struct ChatService {
    database: Database,
    vectors: Arc<VectorStore>,
    openai: OpenAiClient,
}

impl ChatService {
    #[inline]
    #[must_use]
    pub fn new(database: Database, vectors: Arc<VectorStore>, openai: OpenAiClient) -> Self {
        Self {
            database,
            vectors,
            openai,
        }
    }

    /// Answer a conversation, grounded in the owner's nearest snippets.
    ///
    /// Retrieval only ever sees vectors belonging to `owner_id`. The reply
    /// is streamed as text chunks as the provider produces them.
    #[inline]
    pub async fn respond(
        &self,
        owner_id: &str,
        transcript: Vec<ChatMessage>,
    ) -> Result<impl Stream<Item = Result<String>> + Send + use<>> {
        if transcript.is_empty() {
            return Err(StashError::Validation(
                "messages must not be empty".to_string(),
            ));
        }

        let snippets = self.retrieve_grounding(owner_id, &transcript).await?;
        info!(
            "Answering chat for owner {} with {} grounding snippets",
            owner_id,
            snippets.len()
        );

        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(ChatMessage::system(build_system_prompt(&snippets)));
        messages.extend(transcript);

        self.openai.stream_completion(messages).await
    }

    /// Fetch the owner's snippets nearest to the conversation tail, ordered
    /// by match rank.
    async fn retrieve_grounding(
        &self,
        owner_id: &str,
        transcript: &[ChatMessage],
    ) -> Result<Vec<Snippet>> {
        let query = history_query(transcript);
        if query.is_empty() {
            debug!("Empty retrieval query, skipping vector search");
            return Ok(Vec::new());
        }

        let query_vector = self.openai.embed(&query).await?;
        let matches = self
            .vectors
            .query(&query_vector, RETRIEVAL_TOP_K, owner_id)
            .await?;
        if matches.is_empty() {
            debug!("No vector matches for owner {}", owner_id);
            return Ok(Vec::new());
        }

        let ids: Vec<String> = matches.iter().map(|m| m.id.clone()).collect();
        let mut snippets = self.database.get_snippets_by_ids(&ids).await?;

        // The record store returns rows in its own order; put them back in
        // match-rank order.
        snippets.sort_by_key(|snippet| ids.iter().position(|id| *id == snippet.id));
        Ok(snippets)
    }
}
