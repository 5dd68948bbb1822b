use std::collections::HashSet;
use std::fmt::Write;

/// Result of comparing snippet ids in SQLite against ids in the vector index.
///
/// Drift can appear when a write fails between the record commit and the
/// vector operation. The report names each side's strays so an operator can
/// repair them by re-saving or deleting the snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub record_count: usize,
    pub vector_count: usize,
    /// Snippet ids present in SQLite but missing from the vector index.
    pub missing_vectors: Vec<String>,
    /// Vector ids with no matching SQLite row.
    pub orphaned_vectors: Vec<String>,
}

impl ConsistencyReport {
    /// Build a report from (id, owner_id) pairs pulled from each store.
    #[inline]
    #[must_use]
    pub fn build(records: &[(String, String)], vectors: &[(String, String)]) -> Self {
        let record_ids: HashSet<&str> = records.iter().map(|(id, _)| id.as_str()).collect();
        let vector_ids: HashSet<&str> = vectors.iter().map(|(id, _)| id.as_str()).collect();

        let mut missing_vectors: Vec<String> = record_ids
            .difference(&vector_ids)
            .map(|id| (*id).to_string())
            .collect();
        missing_vectors.sort();

        let mut orphaned_vectors: Vec<String> = vector_ids
            .difference(&record_ids)
            .map(|id| (*id).to_string())
            .collect();
        orphaned_vectors.sort();

        Self {
            record_count: records.len(),
            vector_count: vectors.len(),
            missing_vectors,
            orphaned_vectors,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.missing_vectors.is_empty() && self.orphaned_vectors.is_empty()
    }

    /// Human-readable summary for the `check` command.
    #[inline]
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Snippet records: {}", self.record_count);
        let _ = writeln!(out, "Indexed vectors: {}", self.vector_count);

        if self.is_consistent() {
            let _ = writeln!(out, "Stores are consistent.");
            return out;
        }

        if !self.missing_vectors.is_empty() {
            let _ = writeln!(
                out,
                "Snippets without a vector ({}):",
                self.missing_vectors.len()
            );
            for id in &self.missing_vectors {
                let _ = writeln!(out, "  {}", id);
            }
        }

        if !self.orphaned_vectors.is_empty() {
            let _ = writeln!(
                out,
                "Vectors without a snippet ({}):",
                self.orphaned_vectors.len()
            );
            for id in &self.orphaned_vectors {
                let _ = writeln!(out, "  {}", id);
            }
        }

        out
    }
}
