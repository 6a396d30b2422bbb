//! In-memory vector store implementation.
//!
//! Useful for testing and small catalogs.

use super::{rank_by_similarity, RecipeDocument, SearchResult, VectorStore};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store keyed by recipe id.
pub struct MemoryVectorStore {
    documents: RwLock<BTreeMap<i64, RecipeDocument>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<i64, RecipeDocument>>> {
        self.documents
            .read()
            .map_err(|e| RagError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<i64, RecipeDocument>>> {
        self.documents
            .write()
            .map_err(|e| RagError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[RecipeDocument]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            store.insert(doc.recipe_id, doc.clone());
        }
        Ok(docs.len())
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.read()?;
        Ok(rank_by_similarity(docs.values().cloned(), query_embedding, limit, min_score))
    }

    async fn get_by_recipe_id(&self, recipe_id: i64) -> Result<Option<RecipeDocument>> {
        Ok(self.read()?.get(&recipe_id).cloned())
    }

    async fn replace_all(&self, docs: &[RecipeDocument]) -> Result<usize> {
        let replacement: BTreeMap<i64, RecipeDocument> =
            docs.iter().map(|doc| (doc.recipe_id, doc.clone())).collect();
        *self.write()? = replacement;
        Ok(docs.len())
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
