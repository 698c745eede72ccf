//! Qdrant vector database storage implementation.
//!
//! Remote gRPC storage: the collection lives in a Qdrant server and record
//! ids map onto Qdrant point ids by hashing, with the original string id kept
//! in the payload. Upserting a point with an existing id replaces it, which
//! gives re-indexing its overwrite semantics for free.

use super::store::{ChunkMetadata, VectorHit, VectorRecord, VectorStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        vectors_config::Config, CreateCollectionBuilder, Distance, PointStruct,
        ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
        VectorsConfig,
    },
    Qdrant,
};
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub struct QdrantStore {
    client: Arc<Qdrant>,
    collection_name: String,
    vector_size: u64,
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let mut hasher = DefaultHasher::new();
                record.id.hash(&mut hasher);
                let numeric_id = hasher.finish();

                let payload: HashMap<String, serde_json::Value> = HashMap::from([
                    ("id".to_string(), json!(record.id)),
                    ("content".to_string(), json!(record.text)),
                    ("source".to_string(), json!(record.metadata.source)),
                    ("file_name".to_string(), json!(record.metadata.file_name)),
                    (
                        "chunk_index".to_string(),
                        json!(record.metadata.chunk_index),
                    ),
                    ("page_count".to_string(), json!(record.metadata.page_count)),
                ]);

                PointStruct::new(numeric_id, record.embedding, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points))
            .await
            .context("Failed to upsert points")?;

        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        let search_result = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    &self.collection_name,
                    query_embedding.to_vec(),
                    k as u64,
                )
                .with_payload(true),
            )
            .await
            .context("Failed to search points")?;

        let hits = search_result
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                let text = payload
                    .get("content")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                VectorHit {
                    text,
                    score: point.score,
                    metadata: payload_metadata(&payload),
                }
            })
            .collect();

        Ok(hits)
    }

    async fn all_metadata(&self) -> Result<Vec<ChunkMetadata>> {
        let mut metadata = Vec::new();
        let mut offset: Option<qdrant_client::qdrant::PointId> = None;

        // Scroll through all points in batches
        loop {
            let mut builder = ScrollPointsBuilder::new(&self.collection_name)
                .limit(100)
                .with_payload(true);

            if let Some(off) = offset {
                builder = builder.offset(off);
            }

            let scroll_result = self
                .client
                .scroll(builder)
                .await
                .context("Failed to scroll points")?;

            for point in &scroll_result.result {
                metadata.push(payload_metadata(&point.payload));
            }

            if let Some(next_offset) = scroll_result.next_page_offset {
                offset = Some(next_offset);
            } else {
                break;
            }
        }

        Ok(metadata)
    }

    async fn count(&self) -> Result<usize> {
        let info = self
            .client
            .collection_info(&self.collection_name)
            .await
            .context("Failed to get collection info")?;

        Ok(info
            .result
            .map(|r| r.points_count.unwrap_or(0) as usize)
            .unwrap_or(0))
    }

    async fn drop_collection(&self) -> Result<()> {
        self.client
            .delete_collection(&self.collection_name)
            .await
            .context("Failed to delete collection")?;

        self.ensure_collection().await?;

        Ok(())
    }
}

fn payload_metadata(payload: &HashMap<String, qdrant_client::qdrant::Value>) -> ChunkMetadata {
    let str_field = |name: &str| {
        payload
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };
    let int_field = |name: &str| {
        payload
            .get(name)
            .and_then(|v| v.as_integer())
            .unwrap_or(0) as usize
    };

    ChunkMetadata {
        source: str_field("source"),
        file_name: str_field("file_name"),
        chunk_index: int_field("chunk_index"),
        page_count: int_field("page_count"),
    }
}

impl QdrantStore {
    /// Connects to a Qdrant server and ensures the collection exists.
    pub async fn connect(url: &str, collection_name: &str, vector_size: u64) -> Result<Self> {
        let client = Arc::new(
            Qdrant::from_url(url)
                .build()
                .context("Failed to connect to Qdrant server")?,
        );

        let store = Self {
            client,
            collection_name: collection_name.to_string(),
            vector_size,
        };

        store.ensure_collection().await?;

        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .context("Failed to check collection")?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection_name).vectors_config(
                        VectorsConfig {
                            config: Some(Config::Params(
                                VectorParamsBuilder::new(self.vector_size, Distance::Cosine)
                                    .build(),
                            )),
                        },
                    ),
                )
                .await
                .context("Failed to create collection")?;
        }

        Ok(())
    }
}
