//! LanceDB-backed listing index implementation.

use crate::filter::try_parse_number;
use crate::types::{Listing, ScoredListing};
use crate::vector_index::ListingIndex;
use arrow_array::{
    Array, FixedSizeListArray, Float64Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use propchat_core::{AppError, AppResult};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use std::path::Path;
use std::sync::Arc;

/// Name of the listings table inside the LanceDB database.
const TABLE_NAME: &str = "listings";

/// LanceDB-backed vector index for property listings.
///
/// Each row carries the embedding, the embedded content text, a few
/// structured columns mirroring the ingestion schema, and the full
/// metadata map as a JSON column. The JSON column is authoritative when
/// reading rows back; the structured columns exist for external SQL-side
/// inspection of the table.
pub struct LanceDbListings {
    table: Table,
    embedding_dim: usize,
}

impl LanceDbListings {
    /// Open an existing listing index.
    ///
    /// Fails with a configuration error when the database or the listings
    /// table does not exist: a process without a populated index must not
    /// serve queries.
    pub async fn open(db_path: &Path, embedding_dim: usize) -> AppResult<Self> {
        if !db_path.exists() {
            return Err(AppError::Config(format!(
                "Listing index not found at {:?}. Run the ingestion loader first.",
                db_path
            )));
        }

        let conn = connect(db_path).await?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Listings(format!("Failed to list tables: {}", e)))?;

        if !table_names.contains(&TABLE_NAME.to_string()) {
            return Err(AppError::Config(format!(
                "Listing index at {:?} has no '{}' table. Run the ingestion loader first.",
                db_path, TABLE_NAME
            )));
        }

        let table = conn
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| AppError::Listings(format!("Failed to open table: {}", e)))?;

        tracing::debug!("Opened listing index at {:?}", db_path);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    /// Create (or open) a listing index, building the table when missing.
    ///
    /// Used by the ingestion loader and by tests; the query path always
    /// goes through [`LanceDbListings::open`].
    pub async fn create(db_path: &Path, embedding_dim: usize) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Listings(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = connect(db_path).await?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Listings(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.contains(&TABLE_NAME.to_string()) {
            conn.open_table(TABLE_NAME)
                .execute()
                .await
                .map_err(|e| AppError::Listings(format!("Failed to open table: {}", e)))?
        } else {
            let schema = Self::create_schema(embedding_dim);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            conn.create_table(
                TABLE_NAME,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::Listings(format!("Failed to create table: {}", e)))?
        };

        tracing::debug!("Initialized listing index at {:?}", db_path);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    /// Arrow schema for the listings table.
    fn create_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("slug", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
            // Structured columns mirroring the ingestion schema
            Field::new("project_name", DataType::Utf8, true),
            Field::new("city", DataType::Utf8, true),
            Field::new("locality", DataType::Utf8, true),
            Field::new("bhk", DataType::Utf8, true),
            Field::new("price", DataType::Float64, true),
            Field::new("price_in_cr", DataType::Float64, true),
            Field::new("status", DataType::Utf8, true),
            // Full metadata map, authoritative on read
            Field::new("metadata", DataType::Utf8, false),
        ]))
    }

    /// Convert one listing to an Arrow RecordBatch.
    fn listing_to_batch(&self, listing: &Listing) -> AppResult<RecordBatch> {
        let schema = Self::create_schema(self.embedding_dim);

        let embedding = listing
            .embedding
            .as_ref()
            .ok_or_else(|| AppError::Listings("Listing missing embedding".to_string()))?;

        if embedding.len() != self.embedding_dim {
            return Err(AppError::Listings(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                embedding.len()
            )));
        }

        let metadata_json = serde_json::to_string(&listing.metadata)
            .map_err(|e| AppError::Listings(format!("Failed to serialize metadata: {}", e)))?;

        let slug_array = StringArray::from(vec![listing.slug()]);
        let content_array = StringArray::from(vec![listing.content.as_str()]);

        let embedding_values = arrow_array::Float32Array::from(embedding.clone());
        let embedding_array = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(embedding_values),
            None,
        );

        let md = &listing.metadata;
        let project_name_array = StringArray::from(vec![Some(listing.str_field("projectName"))]);
        let city_array = StringArray::from(vec![Some(listing.str_field("city"))]);
        let locality_array = StringArray::from(vec![Some(listing.str_field("locality"))]);
        let bhk_array = StringArray::from(vec![Some(listing.bhk())]);
        let price_array = Float64Array::from(vec![try_parse_number(md.get("price"))]);
        let price_in_cr_array = Float64Array::from(vec![try_parse_number(md.get("price_in_cr"))]);
        let status_array = StringArray::from(vec![Some(listing.str_field("status"))]);

        let metadata_array = StringArray::from(vec![metadata_json.as_str()]);

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(slug_array),
                Arc::new(content_array),
                Arc::new(embedding_array),
                Arc::new(project_name_array),
                Arc::new(city_array),
                Arc::new(locality_array),
                Arc::new(bhk_array),
                Arc::new(price_array),
                Arc::new(price_in_cr_array),
                Arc::new(status_array),
                Arc::new(metadata_array),
            ],
        )
        .map_err(|e| AppError::Listings(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Convert one Arrow RecordBatch row back into a Listing.
    fn batch_to_listing(&self, batch: &RecordBatch, row_idx: usize) -> AppResult<Listing> {
        let content = batch
            .column_by_name("content")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| AppError::Listings("Invalid content column".to_string()))?
            .value(row_idx)
            .to_string();

        let embedding_list = batch
            .column_by_name("embedding")
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| AppError::Listings("Invalid embedding column".to_string()))?;

        let embedding_array_ref = embedding_list.value(row_idx);
        let embedding_values = embedding_array_ref
            .as_any()
            .downcast_ref::<arrow_array::Float32Array>()
            .ok_or_else(|| AppError::Listings("Invalid embedding values".to_string()))?;

        let embedding: Vec<f32> = (0..embedding_values.len())
            .map(|i| embedding_values.value(i))
            .collect();

        let metadata_json = batch
            .column_by_name("metadata")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| AppError::Listings("Invalid metadata column".to_string()))?
            .value(row_idx);

        let metadata: serde_json::Value = serde_json::from_str(metadata_json)
            .map_err(|e| AppError::Listings(format!("Failed to parse metadata: {}", e)))?;

        Ok(Listing::new(content, metadata).with_embedding(embedding))
    }
}

async fn connect(db_path: &Path) -> AppResult<lancedb::Connection> {
    let uri = db_path.to_string_lossy().to_string();
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| AppError::Listings(format!("Failed to connect to LanceDB: {}", e)))
}

impl ListingIndex for LanceDbListings {
    fn add_listings(&mut self, listings: &[Listing]) -> AppResult<()> {
        if listings.is_empty() {
            return Ok(());
        }

        let batches: Vec<RecordBatch> = listings
            .iter()
            .map(|listing| self.listing_to_batch(listing))
            .collect::<AppResult<Vec<_>>>()?;

        let combined_batch = if batches.len() == 1 {
            batches.into_iter().next().unwrap()
        } else {
            let schema = batches[0].schema();
            arrow_select::concat::concat_batches(&schema, &batches)
                .map_err(|e| AppError::Listings(format!("Failed to concat batches: {}", e)))?
        };

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                self.table
                    .add(RecordBatchIterator::new(
                        vec![Ok(combined_batch.clone())],
                        combined_batch.schema(),
                    ))
                    .execute()
                    .await
                    .map_err(|e| AppError::Listings(format!("Failed to add listings: {}", e)))?;
                Ok::<(), AppError>(())
            })
        })?;

        tracing::debug!("Batch inserted {} listings into LanceDB", listings.len());
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredListing>> {
        if query_embedding.len() != self.embedding_dim {
            return Err(AppError::Listings(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                query_embedding.len()
            )));
        }

        let query_vec = query_embedding.to_vec();
        let batches = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                use futures::TryStreamExt;

                self.table
                    .query()
                    .nearest_to(query_vec.clone())
                    .map_err(|e| AppError::Listings(format!("Failed to create query: {}", e)))?
                    .limit(top_k)
                    .execute()
                    .await
                    .map_err(|e| AppError::Listings(format!("Failed to execute search: {}", e)))?
                    .try_collect::<Vec<_>>()
                    .await
                    .map_err(|e| AppError::Listings(format!("Failed to collect results: {}", e)))
            })
        })?;

        let mut scored = Vec::new();

        for batch in &batches {
            for row_idx in 0..batch.num_rows() {
                let listing = match self.batch_to_listing(batch, row_idx) {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::warn!("Failed to convert batch row {} to listing: {}", row_idx, e);
                        continue;
                    }
                };

                let score = match &listing.embedding {
                    Some(embedding) => cosine_similarity(query_embedding, embedding),
                    None => 0.0,
                };

                scored.push((listing, score));
            }
        }

        // Descending similarity
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        tracing::debug!("Retrieved {} listings (requested top-{})", scored.len(), top_k);

        Ok(scored)
    }

    fn count(&self) -> AppResult<usize> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                self.table
                    .count_rows(None)
                    .await
                    .map_err(|e| AppError::Listings(format!("Failed to count rows: {}", e)))
            })
        })
    }
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_listing(slug: &str, seed: f32) -> Listing {
        let mut embedding = vec![0.0_f32; 8];
        embedding[0] = seed;
        embedding[1] = 1.0 - seed;

        Listing::new(
            format!("listing {}", slug),
            json!({
                "slug": slug,
                "projectName": "Sample Project",
                "city": "Pune",
                "price": 7_500_000.0,
            }),
        )
        .with_embedding(embedding)
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0];
        let c = vec![0.0, 1.0];

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &b), 0.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_missing_index_is_config_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no-such-index");

        let result = LanceDbListings::open(&missing, 8).await;
        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("not found")),
            other => panic!("Expected Config error, got {:?}", other.err()),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_add_and_search_roundtrip() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("index");

        let mut index = LanceDbListings::create(&db_path, 8).await.unwrap();
        index
            .add_listings(&[
                sample_listing("alpha-towers-pune", 1.0),
                sample_listing("beta-heights-pune", 0.0),
            ])
            .unwrap();

        assert_eq!(index.count().unwrap(), 2);

        let mut query = vec![0.0_f32; 8];
        query[0] = 1.0;

        let results = index.search(&query, 2).unwrap();
        assert_eq!(results.len(), 2);
        // Closest vector first
        assert_eq!(results[0].0.slug(), "alpha-towers-pune");
        assert!(results[0].1 >= results[1].1);
        // Metadata survives the roundtrip
        assert_eq!(results[0].0.str_field("city"), "Pune");

        // Reopening the persisted index works
        drop(index);
        let reopened = LanceDbListings::open(&db_path, 8).await.unwrap();
        assert_eq!(reopened.count().unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_search_rejects_wrong_dimension() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("index");

        let index = LanceDbListings::create(&db_path, 8).await.unwrap();
        let result = index.search(&[1.0, 2.0], 5);
        assert!(result.is_err());
    }
}
