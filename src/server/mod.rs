// HTTP server
// Thin axum layer over the snippet and chat services


pub mod auth;
pub mod errors;
pub mod routes;

pub use auth::{IdentityProvider, StaticTokenProvider};
pub use errors::ApiError;

use crate::chat::ChatService;
use crate::config::Config;
use crate::database::lancedb::VectorStore;
use crate::database::sqlite::Database;
use crate::openai::OpenAiClient;
use crate::snippets::SnippetService;
use crate::{Result, StashError};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state handed to every request handler.
pub struct AppState {
    pub snippets: SnippetService,
    pub chat: ChatService,
    pub auth: Arc<dyn IdentityProvider>,
}

/// Build the application state from configuration, opening both stores.
#[inline]
pub async fn build_state(config: &Config) -> Result<AppState> {
    let database = Database::from_config(config)
        .await
        .map_err(|e| StashError::Database(e.to_string()))?;
    let vectors = Arc::new(VectorStore::new(config).await?);
    let openai = OpenAiClient::new(&config.openai)?;

    Ok(AppState {
        snippets: SnippetService::new(database.clone(), Arc::clone(&vectors), openai.clone()),
        chat: ChatService::new(database, vectors, openai),
        auth: Arc::new(StaticTokenProvider::new(&config.auth)),
    })
}

/// Assemble the API router.
#[inline]
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/snippets",
            get(routes::list_snippets)
                .post(routes::create_snippet)
                .put(routes::update_snippet)
                .delete(routes::delete_snippet),
        )
        .route("/api/chat", post(routes::chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the server until the process is stopped.
#[inline]
pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(build_state(&config).await?);
    let app = router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
