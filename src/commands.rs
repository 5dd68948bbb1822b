use crate::config::Config;
use crate::database::lancedb::VectorStore;
use crate::database::sqlite::Database;
use crate::snippets::ConsistencyReport;
use crate::{Result, StashError};
use tracing::info;

/// Run the HTTP server with the given configuration.
#[inline]
pub async fn serve(config: Config) -> Result<()> {
    info!("Starting server with base dir {}", config.base_dir.display());
    crate::server::serve(config).await
}

/// Compare snippet ids across both stores and print a drift report.
///
/// Exits nonzero on drift so the command is usable from scripts. Opens the
/// stores directly: no provider credentials are needed to run a check.
#[inline]
pub async fn check(config: Config) -> Result<()> {
    let database = Database::from_config(&config)
        .await
        .map_err(|e| StashError::Database(e.to_string()))?;
    let vectors = VectorStore::new(&config).await?;

    let records = database
        .list_snippet_ids()
        .await
        .map_err(|e| StashError::Database(e.to_string()))?;
    let vector_ids = vectors.list_ids().await?;

    let report = ConsistencyReport::build(&records, &vector_ids);
    print!("{}", report.summary());

    if !report.is_consistent() {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the active configuration as TOML, with the API key redacted.
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    let mut redacted = config.clone();
    if redacted.openai.api_key.is_some() {
        redacted.openai.api_key = Some("<redacted>".to_string());
    }

    let rendered = toml::to_string_pretty(&redacted)
        .map_err(|e| StashError::Config(format!("Failed to render config: {}", e)))?;
    print!("{}", rendered);
    Ok(())
}
