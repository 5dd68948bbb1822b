use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;

/// Durable snippet record. The id doubles as the key of the snippet's vector
/// in the LanceDB index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Snippet {
    pub id: String,
    pub title: String,
    pub content: String,
    pub language: Language,
    pub owner_id: String,
    pub created_date: NaiveDateTime,
    pub updated_date: NaiveDateTime,
}

/// Closed set of supported snippet languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Python,
    Html,
    Css,
}

pub const SUPPORTED_LANGUAGES: [Language; 5] = [
    Language::Javascript,
    Language::Typescript,
    Language::Python,
    Language::Html,
    Language::Css,
];

impl Language {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Python => "python",
            Language::Html => "html",
            Language::Css => "css",
        }
    }
}

impl std::fmt::Display for Language {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "javascript" => Ok(Language::Javascript),
            "typescript" => Ok(Language::Typescript),
            "python" => Ok(Language::Python),
            "html" => Ok(Language::Html),
            "css" => Ok(Language::Css),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLanguage(pub String);

impl std::fmt::Display for UnknownLanguage {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown language: {}", self.0)
    }
}

impl std::error::Error for UnknownLanguage {}

/// Validated fields for a snippet insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnippet {
    pub title: String,
    pub content: String,
    pub language: Language,
}

/// Validated fields for a snippet update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetUpdate {
    pub id: String,
    pub title: String,
    pub content: String,
    pub language: Language,
}
