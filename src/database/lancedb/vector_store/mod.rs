
use super::SnippetVector;
use crate::StashError;
use crate::config::Config;
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "snippets";

/// Vector index over snippet embeddings, backed by LanceDB.
pub struct VectorStore {
    connection: Connection,
    vector_dimension: usize,
}

/// A nearest-neighbor match: the snippet id and its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
}

impl VectorStore {
    /// Open (or create) the vector index under the configured base directory.
    #[inline]
    pub async fn new(config: &Config) -> Result<Self, StashError> {
        let db_path = config.vector_db_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StashError::Database(format!("Failed to create vector database directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| StashError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let store = Self {
            connection,
            vector_dimension: config.openai.embedding_dimension,
        };

        store.initialize_table().await?;

        info!("Vector store initialized successfully");
        Ok(store)
    }

    /// Create the snippets table with the configured dimension if it is missing.
    async fn initialize_table(&self) -> Result<(), StashError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| StashError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&TABLE_NAME.to_string()) {
            debug!("Snippets vector table already exists");
            return Ok(());
        }

        self.connection
            .create_empty_table(TABLE_NAME, self.schema())
            .execute()
            .await
            .map_err(|e| StashError::Database(format!("Failed to create table: {}", e)))?;

        info!(
            "Snippets vector table created with {} dimensions",
            self.vector_dimension
        );
        Ok(())
    }

    fn schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    self.vector_dimension as i32,
                ),
                false,
            ),
            Field::new("owner_id", DataType::Utf8, false),
        ]))
    }

    async fn open_table(&self) -> Result<Table, StashError> {
        self.connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| StashError::Database(format!("Failed to open table: {}", e)))
    }

    /// Insert or replace the vector stored under `record.id`.
    ///
    /// LanceDB has no native upsert, so any existing row with the same id is
    /// deleted before the new row is added.
    #[inline]
    pub async fn upsert(&self, record: SnippetVector) -> Result<(), StashError> {
        if record.vector.len() != self.vector_dimension {
            return Err(StashError::Database(format!(
                "Vector dimension mismatch: expected {}, got {}",
                self.vector_dimension,
                record.vector.len()
            )));
        }

        let table = self.open_table().await?;

        table
            .delete(&format!("id = '{}'", sql_literal(&record.id)))
            .await
            .map_err(|e| StashError::Database(format!("Failed to replace existing vector: {}", e)))?;

        let batch = self.create_record_batch(&record)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| StashError::Database(format!("Failed to insert vector: {}", e)))?;

        debug!("Upserted vector for snippet {}", record.id);
        Ok(())
    }

    fn create_record_batch(&self, record: &SnippetVector) -> Result<RecordBatch, StashError> {
        let values_array = Float32Array::from(record.vector.clone());
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.vector_dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| StashError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(vec![record.id.as_str()])),
            Arc::new(vector_array),
            Arc::new(StringArray::from(vec![record.owner_id.as_str()])),
        ];

        RecordBatch::try_new(self.schema(), arrays)
            .map_err(|e| StashError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Nearest-neighbor search restricted to a single owner's vectors.
    #[inline]
    pub async fn query(
        &self,
        query_vector: &[f32],
        top_k: usize,
        owner_id: &str,
    ) -> Result<Vec<VectorMatch>, StashError> {
        debug!("Searching vectors for owner {} with top_k {}", owner_id, top_k);

        let table = self.open_table().await?;

        let results = table
            .vector_search(query_vector)
            .map_err(|e| StashError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(top_k)
            .only_if(format!("owner_id = '{}'", sql_literal(owner_id)))
            .execute()
            .await
            .map_err(|e| StashError::Database(format!("Failed to execute search: {}", e)))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| StashError::Database(format!("Failed to read result stream: {}", e)))?;

        let mut matches = Vec::new();
        for batch in &batches {
            matches.extend(parse_match_batch(batch)?);
        }

        debug!("Found {} vector matches", matches.len());
        Ok(matches)
    }

    /// Delete the vector stored under `id`.
    #[inline]
    pub async fn delete_by_id(&self, id: &str) -> Result<(), StashError> {
        let table = self.open_table().await?;

        table
            .delete(&format!("id = '{}'", sql_literal(id)))
            .await
            .map_err(|e| StashError::Database(format!("Failed to delete vector: {}", e)))?;

        debug!("Deleted vector for snippet {}", id);
        Ok(())
    }

    /// Total number of stored vectors.
    #[inline]
    pub async fn count(&self) -> Result<u64, StashError> {
        let table = self.open_table().await?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| StashError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// All stored (id, owner_id) pairs, for consistency checks against SQLite.
    #[inline]
    pub async fn list_ids(&self) -> Result<Vec<(String, String)>, StashError> {
        let table = self.open_table().await?;

        let results = table
            .query()
            .execute()
            .await
            .map_err(|e| StashError::Database(format!("Failed to scan table: {}", e)))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| StashError::Database(format!("Failed to read scan stream: {}", e)))?;

        let mut ids = Vec::new();
        for batch in &batches {
            let id_column = string_column(batch, "id")?;
            let owner_column = string_column(batch, "owner_id")?;
            for row in 0..batch.num_rows() {
                ids.push((
                    id_column.value(row).to_string(),
                    owner_column.value(row).to_string(),
                ));
            }
        }

        Ok(ids)
    }
}

fn parse_match_batch(batch: &RecordBatch) -> Result<Vec<VectorMatch>, StashError> {
    let ids = string_column(batch, "id")?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut matches = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        matches.push(VectorMatch {
            id: ids.value(row).to_string(),
            score: 1.0 - distance,
        });
    }

    Ok(matches)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, StashError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StashError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| StashError::Database(format!("Invalid {} column type", name)))
}

/// Escape a value for use inside a single-quoted LanceDB filter literal.
fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}
