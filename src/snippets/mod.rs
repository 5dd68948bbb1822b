// Snippet service
// Keeps the record store and the vector index in step for every write


pub mod consistency;
pub mod validation;

pub use consistency::ConsistencyReport;
pub use validation::{
    CreateSnippetRequest, DeleteSnippetRequest, MAX_CONTENT_CHARS, UpdateSnippetRequest,
};

use crate::database::lancedb::{SnippetVector, VectorStore};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{Language, Snippet};
use crate::openai::OpenAiClient;
use crate::{Result, StashError};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Build the canonical embedding input for a snippet.
///
/// Every write path embeds exactly this text, so re-embedding unchanged
/// fields produces the same input and search stays comparable across
/// creates and updates.
#[inline]
#[must_use]
pub fn embedding_input(title: &str, language: Language, content: &str) -> String {
    format!(
        "{}\n\nprogramming language: {}\n\n{}",
        title, language, content
    )
}

/// CRUD over snippets, with the vector index updated alongside every write.
///
/// Writes are sequenced: the SQLite row commits first, then the vector
/// operation runs. A vector failure after a committed row surfaces as
/// [`StashError::PartialWrite`] and is never rolled back.
#[derive(Clone)]
pub struct SnippetService {
    database: Database,
    vectors: Arc<VectorStore>,
    openai: OpenAiClient,
}

impl SnippetService {
    #[inline]
    #[must_use]
    pub fn new(database: Database, vectors: Arc<VectorStore>, openai: OpenAiClient) -> Self {
        Self {
            database,
            vectors,
            openai,
        }
    }

    /// Create a snippet and index its embedding under the same id.
    #[inline]
    pub async fn create(&self, owner_id: &str, request: &CreateSnippetRequest) -> Result<Snippet> {
        let new_snippet = validation::validate_create(request)?;

        // Embed before touching either store so a provider failure leaves
        // nothing behind.
        let input = embedding_input(&new_snippet.title, new_snippet.language, &new_snippet.content);
        let vector = self.openai.embed(&input).await?;

        let snippet = self.database.insert_snippet(owner_id, &new_snippet).await?;
        debug!("Created snippet {} for owner {}", snippet.id, owner_id);

        if let Err(e) = self
            .vectors
            .upsert(SnippetVector {
                id: snippet.id.clone(),
                vector,
                owner_id: owner_id.to_string(),
            })
            .await
        {
            error!(
                "Vector upsert failed after record commit for snippet {}: {}",
                snippet.id, e
            );
            return Err(StashError::PartialWrite {
                id: snippet.id,
                operation: "upsert",
            });
        }

        info!("Snippet {} created and indexed", snippet.id);
        Ok(snippet)
    }

    /// Update a snippet owned by `owner_id` and re-embed its new content.
    #[inline]
    pub async fn update(&self, owner_id: &str, request: &UpdateSnippetRequest) -> Result<Snippet> {
        let update = validation::validate_update(request)?;

        let existing = self
            .database
            .get_snippet(&update.id)
            .await?
            .ok_or_else(|| StashError::NotFound(update.id.clone()))?;

        if existing.owner_id != owner_id {
            return Err(StashError::Unauthorized);
        }

        let input = embedding_input(&update.title, update.language, &update.content);
        let vector = self.openai.embed(&input).await?;

        let snippet = self
            .database
            .update_snippet(&update)
            .await?
            .ok_or_else(|| StashError::NotFound(update.id.clone()))?;
        debug!("Updated snippet {} for owner {}", snippet.id, owner_id);

        if let Err(e) = self
            .vectors
            .upsert(SnippetVector {
                id: snippet.id.clone(),
                vector,
                owner_id: owner_id.to_string(),
            })
            .await
        {
            error!(
                "Vector upsert failed after record update for snippet {}: {}",
                snippet.id, e
            );
            return Err(StashError::PartialWrite {
                id: snippet.id,
                operation: "upsert",
            });
        }

        info!("Snippet {} updated and re-indexed", snippet.id);
        Ok(snippet)
    }

    /// Delete a snippet owned by `owner_id` along with its vector.
    #[inline]
    pub async fn delete(&self, owner_id: &str, request: &DeleteSnippetRequest) -> Result<()> {
        let id = validation::validate_delete(request)?;

        let existing = self
            .database
            .get_snippet(&id)
            .await?
            .ok_or_else(|| StashError::NotFound(id.clone()))?;

        if existing.owner_id != owner_id {
            return Err(StashError::Unauthorized);
        }

        if !self.database.delete_snippet(&id).await? {
            return Err(StashError::NotFound(id));
        }
        debug!("Deleted snippet {} for owner {}", id, owner_id);

        if let Err(e) = self.vectors.delete_by_id(&id).await {
            error!(
                "Vector delete failed after record delete for snippet {}: {}",
                id, e
            );
            return Err(StashError::PartialWrite {
                id,
                operation: "delete",
            });
        }

        info!("Snippet {} deleted from both stores", id);
        Ok(())
    }

    /// List all snippets owned by `owner_id`, newest first.
    #[inline]
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Snippet>> {
        Ok(self.database.list_snippets_by_owner(owner_id).await?)
    }

    /// Compare the record store and the vector index and report any drift.
    #[inline]
    pub async fn check_consistency(&self) -> Result<ConsistencyReport> {
        let records = self.database.list_snippet_ids().await?;
        let vectors = self.vectors.list_ids().await?;
        Ok(ConsistencyReport::build(&records, &vectors))
    }
}
