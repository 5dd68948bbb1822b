use super::models::{NewSnippet, Snippet, SnippetUpdate};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

const SNIPPET_COLUMNS: &str =
    "id, title, content, language, owner_id, created_date, updated_date";

pub struct SnippetQueries;

impl SnippetQueries {
    /// Insert a new snippet. The id is assigned here and is the key under
    /// which the snippet's vector must be stored.
    #[inline]
    pub async fn create(
        pool: &SqlitePool,
        owner_id: &str,
        new_snippet: &NewSnippet,
    ) -> Result<Snippet> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO snippets (id, title, content, language, owner_id, created_date, updated_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new_snippet.title)
        .bind(&new_snippet.content)
        .bind(new_snippet.language)
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert snippet")?;

        tx.commit().await.context("Failed to commit snippet insert")?;

        debug!("Inserted snippet {} for owner {}", id, owner_id);

        Self::get_by_id(pool, &id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created snippet"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Snippet>> {
        sqlx::query_as::<_, Snippet>(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get snippet by id")
    }

    /// Multi-get by ids. Returns only the snippets that exist; order is
    /// unspecified, callers needing rank order must reorder themselves.
    #[inline]
    pub async fn get_by_ids(pool: &SqlitePool, ids: &[String]) -> Result<Vec<Snippet>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = sqlx::QueryBuilder::new(format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets WHERE id IN ("
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        builder
            .build_query_as::<Snippet>()
            .fetch_all(pool)
            .await
            .context("Failed to get snippets by ids")
    }

    #[inline]
    pub async fn list_by_owner(pool: &SqlitePool, owner_id: &str) -> Result<Vec<Snippet>> {
        sqlx::query_as::<_, Snippet>(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets WHERE owner_id = ? ORDER BY created_date DESC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .context("Failed to list snippets by owner")
    }

    /// Update the mutable fields and bump `updated_date`. Returns `None` if
    /// no row with the id exists.
    #[inline]
    pub async fn update(pool: &SqlitePool, update: &SnippetUpdate) -> Result<Option<Snippet>> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            "UPDATE snippets SET title = ?, content = ?, language = ?, updated_date = ? WHERE id = ?",
        )
        .bind(&update.title)
        .bind(&update.content)
        .bind(update.language)
        .bind(now)
        .bind(&update.id)
        .execute(pool)
        .await
        .context("Failed to update snippet")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        debug!("Updated snippet {}", update.id);
        Self::get_by_id(pool, &update.id).await
    }

    /// Delete by id. Returns whether a row was removed.
    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete snippet")?;

        Ok(result.rows_affected() > 0)
    }

    /// All ids with their owners, for consistency checks against the vector index.
    #[inline]
    pub async fn list_all_ids(pool: &SqlitePool) -> Result<Vec<(String, String)>> {
        sqlx::query_as::<_, (String, String)>("SELECT id, owner_id FROM snippets")
            .fetch_all(pool)
            .await
            .context("Failed to list snippet ids")
    }
}
