//! LanceDB-backed vector index, opened read-only.
//!
//! Expected table layout (as written by the ingestion job):
//! - `text`: Utf8 passage text
//! - `vector` or `embedding`: FixedSizeList<Float32> of the index dimension
//! - `metadata` (optional): Utf8 JSON object with provenance

use crate::types::{Evidence, EvidenceSource, SOURCE_KEY};
use crate::vector_index::VectorIndex;
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Schema};
use corag_core::{AppError, AppResult};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::Path;

const TEXT_COLUMN: &str = "text";
const METADATA_COLUMN: &str = "metadata";
const VECTOR_COLUMNS: [&str; 2] = ["vector", "embedding"];
/// Column LanceDB appends to vector search results.
const DISTANCE_COLUMN: &str = "_distance";

/// Read-only LanceDB vector index.
pub struct LanceDbIndex {
    table: Table,
    vector_column: String,
    embedding_dim: usize,
    has_metadata: bool,
}

impl LanceDbIndex {
    /// Open an existing LanceDB table.
    ///
    /// # Arguments
    /// * `db_path` - Directory of the LanceDB database
    /// * `table_name` - Table holding the passages (typically "chunks")
    /// * `embedding_dim` - Dimension the query embedder produces
    ///
    /// A missing table or a schema that does not match is a configuration
    /// error: the index must be built before questions can be answered.
    pub async fn open(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        if !db_path.exists() {
            return Err(AppError::Config(format!(
                "Knowledge index not found at {:?}. Run the ingestion job first.",
                db_path
            )));
        }

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to list tables: {}", e)))?;

        if !table_names.iter().any(|name| name == table_name) {
            return Err(AppError::Config(format!(
                "Table '{}' not found in knowledge index {:?} (found: {})",
                table_name,
                db_path,
                table_names.join(", ")
            )));
        }

        let table = conn
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to open table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to read table schema: {}", e)))?;

        let vector_column = Self::check_schema(&schema, embedding_dim)?;
        let has_metadata = schema.field_with_name(METADATA_COLUMN).is_ok();

        tracing::debug!(
            table = table_name,
            vector_column = %vector_column,
            has_metadata,
            "Opened LanceDB index at {:?}",
            db_path
        );

        Ok(Self {
            table,
            vector_column,
            embedding_dim,
            has_metadata,
        })
    }

    /// Validate the table schema and return the vector column name.
    fn check_schema(schema: &Schema, embedding_dim: usize) -> AppResult<String> {
        match schema.field_with_name(TEXT_COLUMN).map(|f| f.data_type()) {
            Ok(DataType::Utf8) => {}
            _ => {
                return Err(AppError::Config(format!(
                    "Knowledge index has no Utf8 '{}' column",
                    TEXT_COLUMN
                )))
            }
        }

        for name in VECTOR_COLUMNS {
            if let Ok(field) = schema.field_with_name(name) {
                return match field.data_type() {
                    DataType::FixedSizeList(_, dim) if *dim as usize == embedding_dim => {
                        Ok(name.to_string())
                    }
                    DataType::FixedSizeList(_, dim) => Err(AppError::Config(format!(
                        "Knowledge index vectors have {} dimensions, embedder produces {}",
                        dim, embedding_dim
                    ))),
                    other => Err(AppError::Config(format!(
                        "Column '{}' has unsupported type {:?}",
                        name, other
                    ))),
                };
            }
        }

        Err(AppError::Config(format!(
            "Knowledge index has no vector column (looked for: {})",
            VECTOR_COLUMNS.join(", ")
        )))
    }

    /// Convert one result row into evidence plus its cosine similarity.
    fn row_to_evidence(&self, batch: &RecordBatch, row_idx: usize) -> AppResult<(Evidence, f32)> {
        let text = batch
            .column_by_name(TEXT_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| AppError::Retrieval("Invalid text column".to_string()))?
            .value(row_idx)
            .to_string();

        // cosine distance is 1 - cosine similarity
        let distance = batch
            .column_by_name(DISTANCE_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| AppError::Retrieval("Search results carry no distances".to_string()))?
            .value(row_idx);

        let mut evidence = Evidence::new(text, EvidenceSource::KnowledgeBase);

        if self.has_metadata {
            let stored = batch
                .column_by_name(METADATA_COLUMN)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .filter(|c| !c.is_null(row_idx))
                .map(|c| c.value(row_idx));

            if let Some(raw) = stored {
                match serde_json::from_str::<serde_json::Value>(raw) {
                    Ok(serde_json::Value::Object(map)) => {
                        for (key, value) in map {
                            if key != SOURCE_KEY {
                                evidence = evidence.with_metadata(&key, value);
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Ignoring unparsable metadata in row {}: {}", row_idx, e),
                }
            }
        }

        Ok((evidence, 1.0 - distance))
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn dimensions(&self) -> usize {
        self.embedding_dim
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(Evidence, f32)>> {
        if query_embedding.len() != self.embedding_dim {
            return Err(AppError::Retrieval(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                query_embedding.len()
            )));
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(query_embedding.to_vec())
            .map_err(|e| AppError::Retrieval(format!("Failed to create query: {}", e)))?
            .column(&self.vector_column)
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to collect results: {}", e)))?;

        let mut scored = Vec::new();
        for batch in &batches {
            for row_idx in 0..batch.num_rows() {
                scored.push(self.row_to_evidence(batch, row_idx)?);
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        tracing::debug!(
            "Retrieved {} passages (requested top-{})",
            scored.len(),
            top_k
        );

        Ok(scored)
    }
}
