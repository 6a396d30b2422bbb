//! Vector store abstraction for recipe documents.
//!
//! Provides a trait-based interface for different vector database backends.
//! The recommendation core only reads from a store; the `ingest` module writes to it.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::{Settings, VectorStoreProvider};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// An embedded recipe stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDocument {
    /// Unique document ID.
    pub id: Uuid,
    /// Catalog id of the recipe (`recipe_video_id` upstream).
    pub recipe_id: i64,
    /// Dish / video title.
    pub title: String,
    /// Category name.
    pub category: Option<String>,
    /// Source video URL.
    pub video_url: Option<String>,
    /// Raw comma-separated ingredient field. `None` when upstream data lacked it.
    pub ingredients: Option<String>,
    /// Text that was embedded.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl RecipeDocument {
    /// Create a new document.
    pub fn new(
        recipe_id: i64,
        title: String,
        category: Option<String>,
        video_url: Option<String>,
        ingredients: Option<String>,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipe_id,
            title,
            category,
            video_url,
            ingredients,
            content,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: RecipeDocument,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store documents, replacing any document for the same recipe.
    async fn upsert_batch(&self, docs: &[RecipeDocument]) -> Result<usize>;

    /// Search for similar documents scoring at least `min_score`, best match first.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Get the document for a recipe.
    async fn get_by_recipe_id(&self, recipe_id: i64) -> Result<Option<RecipeDocument>>;

    /// Atomically replace the whole index with `docs`. Returns the number written.
    async fn replace_all(&self, docs: &[RecipeDocument]) -> Result<usize>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Open the vector store selected in the settings.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => {
            Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?))
        }
        VectorStoreProvider::Memory => Ok(Arc::new(MemoryVectorStore::new())),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
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

/// Score, filter, order and truncate documents against a query embedding.
///
/// Ties keep the input order so results are deterministic for a given store.
pub(crate) fn rank_by_similarity(
    docs: impl IntoIterator<Item = RecipeDocument>,
    query_embedding: &[f32],
    limit: usize,
    min_score: f32,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = docs
        .into_iter()
        .map(|document| {
            let score = cosine_similarity(query_embedding, &document.embedding);
            SearchResult { document, score }
        })
        .filter(|r| r.score >= min_score)
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}
