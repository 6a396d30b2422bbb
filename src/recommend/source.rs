//! Similarity-search collaborator for the recommendation pipeline.

use super::CandidateRecord;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::vector_store::{SearchResult, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Anything that can return the `k` recipes most similar to a free-text query,
/// best match first.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn search(&self, query_text: &str, k: usize) -> Result<Vec<CandidateRecord>>;
}

/// Embeds the query and searches a vector store.
pub struct VectorCandidateSource {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    min_score: f32,
}

impl VectorCandidateSource {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            min_score: f32::MIN,
        }
    }

    /// Drop documents below this cosine similarity.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

#[async_trait]
impl CandidateSource for VectorCandidateSource {
    #[instrument(skip(self), fields(k = k))]
    async fn search(&self, query_text: &str, k: usize) -> Result<Vec<CandidateRecord>> {
        let embedding = self
            .embedder
            .embed(query_text)
            .await
            .map_err(|e| RagError::Retrieval(format!("query embedding failed: {}", e)))?;

        let results = self
            .store
            .search_with_threshold(&embedding, k, self.min_score)
            .await
            .map_err(|e| RagError::Retrieval(format!("vector search failed: {}", e)))?;

        debug!("Vector search returned {} documents", results.len());
        Ok(results.into_iter().map(to_candidate).collect())
    }
}

fn to_candidate(result: SearchResult) -> CandidateRecord {
    let doc = result.document;
    match doc.ingredients.as_deref() {
        Some(raw) => CandidateRecord::from_raw(doc.recipe_id, doc.title, raw),
        None => {
            warn!(
                recipe_id = doc.recipe_id,
                "Recipe has no ingredient metadata, scoring as empty"
            );
            CandidateRecord::new(doc.recipe_id, doc.title, Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::{MemoryVectorStore, RecipeDocument};

    /// Embeds by keyword presence so tests control similarity.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![
                if text.contains("김치") { 1.0 } else { 0.0 },
                if text.contains("감자") { 1.0 } else { 0.0 },
            ])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(RagError::OpenAI("503 Service Unavailable".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(RagError::OpenAI("503 Service Unavailable".to_string()))
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    async fn store() -> Arc<MemoryVectorStore> {
        let store = Arc::new(MemoryVectorStore::new());
        let doc = |id, title: &str, items: Option<&str>, embedding| {
            let items = items.map(str::to_string);
            RecipeDocument::new(id, title.into(), None, None, items, String::new(), embedding)
        };
        let docs = vec![
            doc(1, "김치찌개", Some("김치, 두부"), vec![1.0, 0.1]),
            doc(2, "감자조림", Some("감자, 간장"), vec![0.0, 1.0]),
            doc(3, "김치전", None, vec![1.0, 0.0]),
        ];
        store.upsert_batch(&docs).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_search_converts_documents() {
        let source = VectorCandidateSource::new(Arc::new(KeywordEmbedder), store().await);

        let candidates = source.search("김치 요리", 2).await.unwrap();
        let ids: Vec<i64> = candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert!(candidates[0].ingredients.is_empty());
        assert_eq!(candidates[1].ingredients, vec!["김치", "두부"]);
    }

    #[tokio::test]
    async fn test_min_score_filters_pool() {
        let source = VectorCandidateSource::new(Arc::new(KeywordEmbedder), store().await)
            .with_min_score(0.5);

        let candidates = source.search("감자", 10).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_retrieval_error() {
        let source = VectorCandidateSource::new(Arc::new(BrokenEmbedder), store().await);

        let err = source.search("김치", 5).await.unwrap_err();
        assert!(matches!(err, RagError::Retrieval(_)));
    }
}
