// LanceDB vector index module
// Stores one vector per snippet, keyed by the snippet's SQLite id

pub mod vector_store;

pub use vector_store::{VectorMatch, VectorStore};

/// Vector row for a snippet. `id` is the SQLite snippet id; `owner_id` is the
/// metadata filter key for owner-scoped similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetVector {
    pub id: String,
    pub vector: Vec<f32>,
    pub owner_id: String,
}
