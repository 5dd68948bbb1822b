use thiserror::Error;

pub type Result<T> = std::result::Result<T, StashError>;

#[derive(Error, Debug)]
pub enum StashError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Partial write for snippet {id}: record store committed but vector {operation} failed")]
    PartialWrite { id: String, operation: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod database;
pub mod openai;
pub mod server;
pub mod snippets;
