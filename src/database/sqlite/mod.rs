use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;
use crate::database::sqlite::models::{NewSnippet, Snippet, SnippetUpdate};
use crate::database::sqlite::queries::SnippetQueries;

#[cfg(test)]
mod tests;

pub mod models;
pub mod queries;

pub use models::{Language, SUPPORTED_LANGUAGES, UnknownLanguage};

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    /// Open the snippet database under the configured base directory,
    /// creating the directory and file as needed.
    #[inline]
    pub async fn from_config(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.base_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                config.base_dir.display()
            )
        })?;

        Self::new(config.sqlite_path()).await
    }

    // Snippet operations
    #[inline]
    pub async fn insert_snippet(&self, owner_id: &str, new_snippet: &NewSnippet) -> Result<Snippet> {
        SnippetQueries::create(&self.pool, owner_id, new_snippet).await
    }

    #[inline]
    pub async fn get_snippet(&self, id: &str) -> Result<Option<Snippet>> {
        SnippetQueries::get_by_id(&self.pool, id).await
    }

    #[inline]
    pub async fn get_snippets_by_ids(&self, ids: &[String]) -> Result<Vec<Snippet>> {
        SnippetQueries::get_by_ids(&self.pool, ids).await
    }

    #[inline]
    pub async fn list_snippets_by_owner(&self, owner_id: &str) -> Result<Vec<Snippet>> {
        SnippetQueries::list_by_owner(&self.pool, owner_id).await
    }

    #[inline]
    pub async fn update_snippet(&self, update: &SnippetUpdate) -> Result<Option<Snippet>> {
        SnippetQueries::update(&self.pool, update).await
    }

    #[inline]
    pub async fn delete_snippet(&self, id: &str) -> Result<bool> {
        SnippetQueries::delete(&self.pool, id).await
    }

    #[inline]
    pub async fn list_snippet_ids(&self) -> Result<Vec<(String, String)>> {
        SnippetQueries::list_all_ids(&self.pool).await
    }
}
