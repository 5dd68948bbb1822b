use crate::database::sqlite::models::{Language, NewSnippet, SnippetUpdate};
use crate::{Result, StashError};
use serde::Deserialize;

/// Maximum snippet content length, in characters.
pub const MAX_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateSnippetRequest {
    pub title: String,
    pub content: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateSnippetRequest {
    pub id: String,
    pub title: String,
    pub content: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteSnippetRequest {
    pub id: String,
}

#[inline]
pub fn validate_create(request: &CreateSnippetRequest) -> Result<NewSnippet> {
    let language = validate_fields(&request.title, &request.content, &request.language)?;
    Ok(NewSnippet {
        title: request.title.clone(),
        content: request.content.clone(),
        language,
    })
}

#[inline]
pub fn validate_update(request: &UpdateSnippetRequest) -> Result<SnippetUpdate> {
    validate_id(&request.id)?;
    let language = validate_fields(&request.title, &request.content, &request.language)?;
    Ok(SnippetUpdate {
        id: request.id.clone(),
        title: request.title.clone(),
        content: request.content.clone(),
        language,
    })
}

#[inline]
pub fn validate_delete(request: &DeleteSnippetRequest) -> Result<String> {
    validate_id(&request.id)?;
    Ok(request.id.clone())
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(StashError::Validation("id is required".to_string()));
    }
    Ok(())
}

fn validate_fields(title: &str, content: &str, language: &str) -> Result<Language> {
    if title.is_empty() {
        return Err(StashError::Validation("title is required".to_string()));
    }

    if content.is_empty() {
        return Err(StashError::Validation("content is required".to_string()));
    }

    // Character count, not bytes: the limit is user-facing.
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(StashError::Validation(format!(
            "content cannot be longer than {} characters",
            MAX_CONTENT_CHARS
        )));
    }

    language.parse::<Language>().map_err(|e| {
        StashError::Validation(format!("{} (expected one of: javascript, typescript, python, html, css)", e))
    })
}
