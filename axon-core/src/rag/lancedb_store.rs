//! LanceDB vector database storage implementation.
//!
//! Embedded, in-process storage: the collection is a LanceDB table under a
//! configured directory, created on first use.

use super::store::{ChunkMetadata, VectorHit, VectorRecord, VectorStore};
use anyhow::{Context, Result};
use arrow_array::{
    array::{ArrayRef, FixedSizeListArray, Float32Array, StringArray, UInt32Array},
    RecordBatch, RecordBatchIterator,
};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use lancedb::arrow::arrow_schema::{DataType, Field, Schema};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use std::sync::Arc;

/// LanceDB-based vector store for embedded deployment.
pub struct LanceDbStore {
    conn: Connection,
    table: Table,
    vector_size: u64,
}

#[async_trait]
impl VectorStore for LanceDbStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Replace-by-id: delete any rows carrying the incoming ids, then
        // append the new rows in one batch.
        let id_list = records
            .iter()
            .map(|r| format!("'{}'", r.id.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ");
        self.table
            .delete(&format!("id IN ({})", id_list))
            .await
            .context("Failed to delete superseded records")?;

        let schema = Self::create_schema(self.vector_size);

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let contents: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let sources: Vec<&str> = records.iter().map(|r| r.metadata.source.as_str()).collect();
        let file_names: Vec<&str> = records
            .iter()
            .map(|r| r.metadata.file_name.as_str())
            .collect();
        let chunk_indices: Vec<u32> = records
            .iter()
            .map(|r| r.metadata.chunk_index as u32)
            .collect();
        let page_counts: Vec<u32> = records
            .iter()
            .map(|r| r.metadata.page_count as u32)
            .collect();

        let flat_vectors: Vec<f32> = records
            .iter()
            .flat_map(|r| r.embedding.iter().copied())
            .collect();
        let vector_array = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.vector_size as i32,
            Arc::new(Float32Array::from(flat_vectors)),
            None,
        );

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)) as ArrayRef,
                Arc::new(StringArray::from(contents)) as ArrayRef,
                Arc::new(vector_array) as ArrayRef,
                Arc::new(StringArray::from(sources)) as ArrayRef,
                Arc::new(StringArray::from(file_names)) as ArrayRef,
                Arc::new(UInt32Array::from(chunk_indices)) as ArrayRef,
                Arc::new(UInt32Array::from(page_counts)) as ArrayRef,
            ],
        )
        .context("Failed to create record batch")?;

        let schema_ref = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema_ref);

        self.table
            .add(reader)
            .execute()
            .await
            .context("Failed to add records to LanceDB")?;

        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        let results = self
            .table
            .query()
            .limit(k)
            .nearest_to(query_embedding)?
            .distance_type(DistanceType::Cosine)
            .execute()
            .await
            .context("Failed to execute LanceDB query")?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .context("Failed to collect query results")?;

        let mut hits = Vec::new();

        for batch in batches {
            let content_array = string_column(&batch, "content")?;
            let distance_col = batch
                .column_by_name("_distance")
                .context("Missing '_distance' column")?;
            let distance_array = distance_col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("Failed to cast '_distance' to Float32Array")?;

            let metadata = parse_metadata(&batch)?;

            for (i, meta) in metadata.into_iter().enumerate() {
                // Cosine distance in [0, 2]; similarity = 1 - distance.
                let score = 1.0 - distance_array.value(i);

                hits.push(VectorHit {
                    text: content_array.value(i).to_string(),
                    score,
                    metadata: meta,
                });
            }
        }

        Ok(hits)
    }

    async fn all_metadata(&self) -> Result<Vec<ChunkMetadata>> {
        let results = self
            .table
            .query()
            .execute()
            .await
            .context("Failed to scan LanceDB table")?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .context("Failed to collect scan results")?;

        let mut metadata = Vec::new();
        for batch in batches {
            metadata.extend(parse_metadata(&batch)?);
        }

        Ok(metadata)
    }

    async fn count(&self) -> Result<usize> {
        let count = self.table.count_rows(None).await?;
        Ok(count)
    }

    async fn drop_collection(&self) -> Result<()> {
        self.conn
            .drop_table(self.table.name(), &[])
            .await
            .context("Failed to drop table")?;

        let schema = Self::create_schema(self.vector_size);
        self.conn
            .create_empty_table(self.table.name(), schema)
            .execute()
            .await
            .context("Failed to recreate table")?;

        Ok(())
    }
}

impl LanceDbStore {
    fn create_schema(vector_size: u64) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    vector_size as i32,
                ),
                false,
            ),
            Field::new("source", DataType::Utf8, false),
            Field::new("file_name", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("page_count", DataType::UInt32, false),
        ]))
    }

    /// Connects to LanceDB at `path` and ensures the collection table exists.
    pub async fn connect(path: &str, collection_name: &str, vector_size: u64) -> Result<Self> {
        let conn = connect(path)
            .execute()
            .await
            .context("Failed to connect to LanceDB")?;

        let table_names = conn.table_names().execute().await?;

        let table = if table_names.contains(&collection_name.to_string()) {
            conn.open_table(collection_name)
                .execute()
                .await
                .context("Failed to open LanceDB table")?
        } else {
            let schema = Self::create_schema(vector_size);

            conn.create_empty_table(collection_name, schema)
                .execute()
                .await
                .context("Failed to create LanceDB table")?
        };

        Ok(Self {
            conn,
            table,
            vector_size,
        })
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Missing '{}' column", name))?
        .as_any()
        .downcast_ref::<StringArray>()
        .with_context(|| format!("Failed to cast '{}' to StringArray", name))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Missing '{}' column", name))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .with_context(|| format!("Failed to cast '{}' to UInt32Array", name))
}

fn parse_metadata(batch: &RecordBatch) -> Result<Vec<ChunkMetadata>> {
    let source_array = string_column(batch, "source")?;
    let file_name_array = string_column(batch, "file_name")?;
    let chunk_index_array = u32_column(batch, "chunk_index")?;
    let page_count_array = u32_column(batch, "page_count")?;

    let mut metadata = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        metadata.push(ChunkMetadata {
            source: source_array.value(i).to_string(),
            file_name: file_name_array.value(i).to_string(),
            chunk_index: chunk_index_array.value(i) as usize,
            page_count: page_count_array.value(i) as usize,
        });
    }

    Ok(metadata)
}
