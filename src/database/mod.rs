// Database module
// Dual store: SQLite holds the durable snippet records, LanceDB holds their vectors

pub mod lancedb;
pub mod sqlite;

pub use sqlite::*;
